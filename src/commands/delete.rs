//! `workcast delete`: remove a work from a consumer.

use crate::Context;
use crate::cli::DeleteArgs;
use crate::commands::{cancel_token, connect};
use crate::ui;
use anyhow::Result;
use workkit::builder::work_name_for;
use workkit::{CancelToken, Client};

pub fn run(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let consumer = ctx.file.consumer(args.consumer)?;

    let cancel = cancel_token(ctx);
    let client = connect(ctx, &cancel)?;
    let name = remove(&client, &cancel, &consumer, &args.name)?;

    if !ctx.quiet {
        ui::success(&format!("work/{name} deleted from {consumer}"));
    }
    Ok(())
}

/// Delete the work `name` refers to and return its full work name.
fn remove(client: &Client, cancel: &CancelToken, consumer: &str, name: &str) -> Result<String> {
    let name = work_name_for(name);
    client.delete(cancel, consumer, &name)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_bundle;
    use std::sync::Arc;
    use workkit::transport::MemoryTransport;

    #[test]
    fn test_delete_work_applied_with_custom_name() {
        let transport = MemoryTransport::new();
        let client = Client::with_transport(Arc::new(transport.clone()));
        let cancel = CancelToken::new();

        let resources =
            workkit::decode("apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n").unwrap();
        let bundle = build_bundle(&resources, Some("custom")).unwrap();
        client.apply(&cancel, "east", &bundle).unwrap();
        assert_eq!(transport.works("east").len(), 1);

        let removed = remove(&client, &cancel, "east", "custom").unwrap();
        assert_eq!(removed, "custom-work");
        assert!(transport.works("east").is_empty());
    }

    #[test]
    fn test_delete_accepts_full_work_name() {
        let transport = MemoryTransport::new();
        let client = Client::with_transport(Arc::new(transport.clone()));
        let cancel = CancelToken::new();

        let resources =
            workkit::decode("apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n").unwrap();
        client
            .apply(&cancel, "east", &build_bundle(&resources, None).unwrap())
            .unwrap();

        assert_eq!(remove(&client, &cancel, "east", "s-work").unwrap(), "s-work");
        assert!(transport.works("east").is_empty());
    }
}
