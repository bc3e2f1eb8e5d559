//! `workcast render`: build a work locally and print it.

use crate::cli::RenderArgs;
use crate::commands::{build_bundle, format_output, read_manifests};
use anyhow::Result;

pub fn run(args: &RenderArgs) -> Result<()> {
    let resources = read_manifests(&args.file)?;
    let bundle = build_bundle(&resources, args.name.as_deref())?;
    log::info!(
        "Built work {} with {} manifests",
        bundle.name,
        bundle.manifests.len()
    );

    print!("{}", format_output(&bundle, args.output)?);
    Ok(())
}
