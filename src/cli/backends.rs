//! Backends command implementation

use crate::cli::output::{format_backends_json, format_backends_table};
use crate::cli::BackendsListArgs;
use crate::registry::{BackendView, Registry};

/// Handle backends list command
///
/// Backends are listed in default fallback order. Rate budgets are the
/// configured limits; usage counters live in the running server.
pub fn handle_backends_list(args: &BackendsListArgs, registry: &Registry) -> anyhow::Result<String> {
    let views: Vec<BackendView> = registry.views();

    if args.json {
        Ok(format_backends_json(&views)?)
    } else {
        Ok(format_backends_table(&views))
    }
}
