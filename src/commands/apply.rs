//! `workcast apply`: create or update a work on a consumer.

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands::{build_bundle, cancel_token, connect, read_manifests};
use crate::ui;
use anyhow::Result;
use workkit::ApplyResult;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    // Decode and build before connecting so bad input never reaches the hub
    let resources = read_manifests(&args.file)?;
    let bundle = build_bundle(&resources, args.name.as_deref())?;
    let consumer = ctx.file.consumer(args.consumer)?;

    let cancel = cancel_token(ctx);
    let client = connect(ctx, &cancel)?;
    let result = client.apply(&cancel, &consumer, &bundle)?;

    if !ctx.quiet {
        ui::success(&summary(&bundle.name, &consumer, result));
    }
    Ok(())
}

fn summary(work: &str, consumer: &str, result: ApplyResult) -> String {
    let verb = match result {
        ApplyResult::Created => "created",
        ApplyResult::Modified => "configured",
        ApplyResult::NoChange => "unchanged",
    };
    format!("work/{work} {verb} on {consumer}")
}
