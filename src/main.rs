mod cli;
mod commands;
mod config;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, HubArgs};
use config::FileConfig;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub file: FileConfig,
    pub hub: HubArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "workcast", &mut io::stdout());
        return Ok(());
    }

    let ctx = Context {
        quiet: cli.quiet,
        file: FileConfig::load(cli.config.as_deref())?,
        hub: cli.hub,
    };

    match cli.command {
        Command::Render(args) => commands::render::run(&args),
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Diff(args) => commands::diff::run(&ctx, args),
        Command::Get(args) => commands::get::run(&ctx, args),
        Command::Delete(args) => commands::delete::run(&ctx, args),
        Command::List(args) => commands::list::run(&ctx, args),
        Command::Completions { .. } => Ok(()),
    }
}

/// Print an error chain, plus advice when it came from the work library.
fn report(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));
    if let Some(work_err) = err.downcast_ref::<workkit::Error>() {
        let category = work_err.category();
        ui::hint(&format!("{}: {}", category.description(), category.advice()));
    }
}
