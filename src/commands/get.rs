//! `workcast get`: show a work with the status its consumer reported.

use crate::Context;
use crate::cli::{GetArgs, OutputFormat};
use crate::commands::{cancel_token, connect, format_output};
use anyhow::Result;
use workkit::builder::work_name_for;
use workkit::feedback::resources_with_status;
use workkit::TargetKind;

pub fn run(ctx: &Context, args: GetArgs) -> Result<()> {
    let consumer = ctx.file.consumer(args.consumer)?;
    let name = work_name_for(&args.name);

    let cancel = cancel_token(ctx);
    let client = connect(ctx, &cancel)?;

    if let (Some(kind), Some(api_version)) = (&args.kind, &args.api_version) {
        let target = TargetKind::from_api_version(api_version, kind);
        let resource = client.get_status(&cancel, &consumer, &name, &target)?;
        print!("{}", format_output(&resource, args.output)?);
        return Ok(());
    }

    let record = client.get(&cancel, &consumer, &name)?;
    match args.output {
        OutputFormat::Yaml => print!("{}", workkit::encode(&resources_with_status(&record))?),
        OutputFormat::Json => print!("{}", format_output(&record, OutputFormat::Json)?),
    }
    Ok(())
}
