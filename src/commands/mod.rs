// Offline commands
pub mod render;

// Hub commands
pub mod apply;
pub mod delete;
pub mod diff;
pub mod get;
pub mod list;

use crate::Context;
use crate::cli::OutputFormat;
use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use workkit::transport::http::HttpTransport;
use workkit::builder::work_name_for;
use workkit::{AddressedResource, CancelToken, Client, WorkBundle};

/// Decode manifests from a file, or from stdin when the path is `-`.
pub fn read_manifests(path: &Path) -> Result<Vec<AddressedResource>> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read manifests from stdin")?;
        return Ok(workkit::decode(&text)?);
    }
    Ok(workkit::decode_file(path)?)
}

/// Build a work, giving an explicit `--name` the same `-work` suffix that
/// `get` and `delete` add to theirs.
pub fn build_bundle(resources: &[AddressedResource], name: Option<&str>) -> Result<WorkBundle> {
    let name = name.map(work_name_for);
    Ok(workkit::build(resources, name.as_deref())?)
}

/// Token bounding the whole command by `--deadline`, when one is set.
pub fn cancel_token(ctx: &Context) -> CancelToken {
    match ctx.hub.deadline {
        Some(deadline) => CancelToken::with_timeout(deadline),
        None => CancelToken::new(),
    }
}

/// Connect to the configured hub, showing a spinner during the health wait.
pub fn connect(ctx: &Context, cancel: &CancelToken) -> Result<Client> {
    let config = ctx.file.resolve(&ctx.hub)?;
    let transport = HttpTransport::new(&config)?
        .with_user_agent(format!("workcast/{}", env!("CARGO_PKG_VERSION")));

    let spinner = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Waiting for hub at {}", config.base_url()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let health = transport.wait_healthy(cancel, config.health_timeout);
    spinner.finish_and_clear();
    health.with_context(|| format!("Hub at {} is not reachable", config.base_url()))?;

    Ok(Client::from_http(transport).with_page_size(config.page_size))
}

/// Serialize a value for printing.
pub fn format_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
            out.push('\n');
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::HubArgs;
    use crate::config::FileConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_manifests_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n")
            .unwrap();
        let resources = read_manifests(file.path()).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name(), "s");
    }

    #[test]
    fn test_read_manifests_missing_file() {
        let err = read_manifests(Path::new("/nonexistent/manifests.yaml")).unwrap_err();
        assert!(err.downcast_ref::<workkit::Error>().is_some());
    }

    #[test]
    fn test_build_bundle_suffixes_explicit_name() {
        let resources =
            workkit::decode("apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n").unwrap();
        let named = |name| build_bundle(&resources, Some(name)).unwrap().name;
        assert_eq!(named("custom"), "custom-work");
        assert_eq!(named("custom-work"), "custom-work");
        assert_eq!(build_bundle(&resources, None).unwrap().name, "s-work");
    }

    #[test]
    fn test_cancel_token_follows_deadline() {
        let mut ctx = Context {
            quiet: true,
            file: FileConfig::default(),
            hub: HubArgs::default(),
        };
        assert!(cancel_token(&ctx).remaining().is_none());

        ctx.hub.deadline = Some(Duration::from_secs(60));
        let remaining = cancel_token(&ctx).remaining().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(50));
    }

    #[test]
    fn test_format_output() {
        let value = serde_json::json!({"name": "demo"});
        assert_eq!(format_output(&value, OutputFormat::Yaml).unwrap(), "name: demo\n");
        assert_eq!(
            format_output(&value, OutputFormat::Json).unwrap(),
            "{\n  \"name\": \"demo\"\n}\n"
        );
    }
}
