//! Logging setup for the broker binary.
//!
//! Logs always go to stderr: the host speaks NDJSON on stdout and log lines
//! must never interleave with replies.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events the default filter lets through.
const LOG_TARGETS: &[&str] = &["dappshell_broker", "dappshell_core"];

/// Filter directive enabling `level` for every dappshell crate.
pub fn default_directive(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. `RUST_LOG` overrides `level` when set.
pub fn init_tracing(level: &str, log_json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry.with(fmt.json()).init();
    } else {
        registry.with(fmt).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_covers_all_crates() {
        assert_eq!(
            default_directive("debug"),
            "dappshell_broker=debug,dappshell_core=debug"
        );
    }
}
