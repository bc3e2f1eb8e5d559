//! `workcast diff`: show what apply would change, without writing.

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands::{build_bundle, cancel_token, connect, read_manifests};
use crate::ui;
use anyhow::{Context as _, Result};
use workkit::{Plan, WorkBundle};

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let resources = read_manifests(&args.file)?;
    let bundle = build_bundle(&resources, args.name.as_deref())?;
    let consumer = ctx.file.consumer(args.consumer)?;

    let cancel = cancel_token(ctx);
    let client = connect(ctx, &cancel)?;
    let desired = to_yaml(&bundle)?;

    match client.plan(&cancel, &consumer, &bundle)? {
        Plan::NoChange => {
            ui::info(&format!("work/{} on {consumer} is up to date", bundle.name));
        }
        Plan::Create => {
            ui::header(&format!("work/{} (new on {consumer})", bundle.name));
            ui::print_diff("", &desired);
        }
        Plan::Patch(patch) => {
            log::debug!("Merge patch: {patch}");
            let existing = client.get(&cancel, &consumer, &bundle.name)?;
            let current = to_yaml(&existing.bundle)?;
            ui::header(&format!("work/{} on {consumer}", bundle.name));
            ui::print_diff(&current, &desired);
        }
    }

    Ok(())
}

fn to_yaml(bundle: &WorkBundle) -> Result<String> {
    serde_yaml::to_string(bundle).context("Failed to render work as YAML")
}
