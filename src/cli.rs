use crate::config::parse_duration;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "workcast")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Distribute declarative resource bundles to hub consumers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/workcast/config.toml)
    #[arg(long, global = true, env = "WORKCAST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub hub: HubArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Hub connection overrides. Each takes precedence over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct HubArgs {
    /// Hub API base URL
    #[arg(long, global = true, env = "WORKCAST_HUB_URL")]
    pub hub_url: Option<String>,

    /// Source id works are published under
    #[arg(long, global = true, env = "WORKCAST_SOURCE_ID")]
    pub source_id: Option<String>,

    /// How long to wait for the hub to become healthy (e.g. 20s, 1m)
    #[arg(long, global = true, env = "WORKCAST_HEALTH_TIMEOUT", value_parser = parse_duration)]
    pub health_timeout: Option<Duration>,

    /// Per-request timeout (e.g. 10s, 500ms)
    #[arg(long, global = true, env = "WORKCAST_TIMEOUT", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Abort the whole command after this long, including in-flight requests (e.g. 2m)
    #[arg(long, global = true, env = "WORKCAST_DEADLINE", value_parser = parse_duration)]
    pub deadline: Option<Duration>,

    /// Skip TLS certificate verification
    #[arg(long, global = true, env = "WORKCAST_INSECURE_SKIP_VERIFY")]
    pub insecure_skip_verify: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the work bundle from manifests and print it, without contacting the hub
    Render(RenderArgs),

    /// Create or update a work on a consumer
    Apply(ApplyArgs),

    /// Show what apply would change
    Diff(ApplyArgs),

    /// Show a work, or one of its manifests with reported status
    Get(GetArgs),

    /// Delete a work from a consumer
    Delete(DeleteArgs),

    /// List works on one consumer or on every consumer
    List(ListArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

// ============================================================================
// Command arguments
// ============================================================================

#[derive(Parser)]
pub struct RenderArgs {
    /// Manifest file ("-" for stdin)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Work name; "-work" is appended when missing (default: <first resource name>-work)
    #[arg(long)]
    pub name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Manifest file ("-" for stdin)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Target consumer
    #[arg(short, long, env = "WORKCAST_CONSUMER")]
    pub consumer: Option<String>,

    /// Work name; "-work" is appended when missing (default: <first resource name>-work)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Parser)]
pub struct GetArgs {
    /// Work name; "-work" is appended when missing
    pub name: String,

    /// Consumer holding the work
    #[arg(short, long, env = "WORKCAST_CONSUMER")]
    pub consumer: Option<String>,

    /// Only show the first manifest of this kind
    #[arg(long, requires = "api_version")]
    pub kind: Option<String>,

    /// apiVersion of --kind (e.g. apps/v1)
    #[arg(long, requires = "kind")]
    pub api_version: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// Work name; "-work" is appended when missing
    pub name: String,

    /// Consumer holding the work
    #[arg(short, long, env = "WORKCAST_CONSUMER")]
    pub consumer: Option<String>,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Only list works on this consumer
    #[arg(short, long, env = "WORKCAST_CONSUMER")]
    pub consumer: Option<String>,

    /// List every consumer even if a default consumer is configured
    #[arg(long)]
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "workcast",
            "--hub-url",
            "https://hub",
            "apply",
            "-f",
            "app.yaml",
            "-c",
            "east",
            "--timeout",
            "5s",
        ])
        .unwrap();
        assert_eq!(cli.hub.hub_url.as_deref(), Some("https://hub"));
        assert_eq!(cli.hub.timeout, Some(Duration::from_secs(5)));
        assert!(cli.hub.deadline.is_none());
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.file, PathBuf::from("app.yaml"));
                assert_eq!(args.consumer.as_deref(), Some("east"));
                assert!(args.name.is_none());
            }
            _ => panic!("Expected apply"),
        }
    }

    #[test]
    fn test_get_kind_requires_api_version() {
        let result = Cli::try_parse_from(["workcast", "get", "demo", "--kind", "Deployment"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_deadline() {
        let cli = Cli::try_parse_from(["workcast", "--deadline", "2m", "list"]).unwrap();
        assert_eq!(cli.hub.deadline, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_verbose_count() {
        let cli = Cli::try_parse_from(["workcast", "-vv", "list"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
