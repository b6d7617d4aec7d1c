//! Tracing setup for the brainctl CLI
//!
//! Usage:
//!   brainctl --debug ...               # Debug logging for brainctl crates
//!   RUST_LOG=brainctl_core=trace ...   # Fine-grained log control, wins over --debug
//!
//! Logs go to stderr so stdout only carries the run summary.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Raise brainctl's own targets to `debug` unless RUST_LOG is set
    pub debug: bool,
}

/// Directives used when RUST_LOG is absent. Dependencies stay at `warn`.
fn default_directives(debug: bool) -> &'static str {
    if debug {
        "warn,brainctl=debug,brainctl_core=debug"
    } else {
        "warn,brainctl=info,brainctl_core=info"
    }
}

fn build_filter(config: &TracingConfig, rust_log: Option<&str>) -> Result<EnvFilter> {
    let directives = match rust_log {
        Some(value) if !value.trim().is_empty() => value,
        _ => default_directives(config.debug),
    };
    EnvFilter::try_new(directives)
        .map_err(|err| anyhow!("invalid log filter '{directives}': {err}"))
}

pub fn init(config: &TracingConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scope_to_brainctl_targets() {
        let quiet = build_filter(&TracingConfig::default(), None).unwrap();
        assert!(quiet.to_string().contains("brainctl_core=info"));

        let debug = build_filter(&TracingConfig { debug: true }, Some("  ")).unwrap();
        assert!(debug.to_string().contains("brainctl_core=debug"));
    }

    #[test]
    fn rust_log_wins() {
        let filter =
            build_filter(&TracingConfig { debug: true }, Some("brainctl_core=trace")).unwrap();
        assert!(filter.to_string().contains("brainctl_core=trace"));
        assert!(!filter.to_string().contains("debug"));
    }

    #[test]
    fn invalid_rust_log_is_reported() {
        let err =
            build_filter(&TracingConfig::default(), Some("brainctl_core=loud")).unwrap_err();
        assert!(err.to_string().contains("invalid log filter"));
    }
}
