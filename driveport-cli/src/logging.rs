//! # Logging Setup
//!
//! Builds the tracing subscriber for the CLI. Logs go to stderr so that
//! census tables and run summaries on stdout stay machine-consumable.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Initialize the global subscriber
///
/// Precedence: the `RUST_LOG` environment variable, then the configured
/// `filter`, then a default built from `level` with driveport crates at
/// that level and HTTP dependencies held at `warn`.
pub fn init(level: Option<&str>, filter: Option<&str>, format: LogFormat) -> anyhow::Result<()> {
    let directives = match (std::env::var("RUST_LOG").ok(), filter) {
        (Some(env), _) => env,
        (None, Some(filter)) => filter.to_string(),
        (None, None) => {
            let level = level.unwrap_or("info");
            format!(
                "driveport={level},core_extract={level},core_auth={level},\
                 core_remote={level},provider_drive={level},\
                 h2=warn,hyper=warn,reqwest=warn"
            )
        }
    };

    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {}", directives))?;

    match format {
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize logging")?;
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_target(true)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize logging")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_filter() {
        std::env::remove_var("RUST_LOG");
        let result = init(None, Some("driveport=notalevel"), LogFormat::Compact);
        assert!(result.is_err());
    }
}
