//! `workcast list`: tabulate works on one consumer or across all of them.

use crate::Context;
use crate::cli::ListArgs;
use crate::commands::{cancel_token, connect};
use crate::ui;
use anyhow::Result;
use workkit::lister::has_multiple_consumers;
use workkit::{ListScope, WorkInfo};

pub fn run(ctx: &Context, args: ListArgs) -> Result<()> {
    let scope = match args.consumer.or_else(|| ctx.file.consumer.clone()) {
        Some(consumer) if !args.all => ListScope::Consumer(consumer),
        _ => ListScope::All,
    };

    let cancel = cancel_token(ctx);
    let client = connect(ctx, &cancel)?;
    let works = client.list(&cancel, &scope)?;

    if works.is_empty() {
        if !ctx.quiet {
            ui::info("No works found");
        }
        return Ok(());
    }

    let with_consumer = scope == ListScope::All || has_multiple_consumers(&works);
    print!("{}", render(&works, with_consumer));
    Ok(())
}

/// Table of works; the consumer column is shown only when asked for.
pub fn render(works: &[WorkInfo], with_consumer: bool) -> String {
    let rows: Vec<Vec<String>> = works
        .iter()
        .map(|w| {
            let mut row = Vec::with_capacity(4);
            if with_consumer {
                row.push(w.consumer.clone());
            }
            row.push(w.display_name.clone());
            row.push(w.work_name.clone());
            row.push(w.created_display());
            row
        })
        .collect();

    if with_consumer {
        ui::table(&["CONSUMER", "NAME", "WORK", "CREATED"], &rows)
    } else {
        ui::table(&["NAME", "WORK", "CREATED"], &rows)
    }
}
