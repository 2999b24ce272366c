//! Tracing initialization
//!
//! Provides standardized tracing setup for the hub binary and anything else
//! that embeds the tools.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
///
/// Sets up logging to stderr with:
/// - Environment-based filtering via RUST_LOG (takes precedence when set)
/// - A default level derived from `verbosity` (0 = info, 1 = debug, 2+ = trace)
///   applied to the named crate, `warn` for everything else
///
/// Set `LOG_FORMAT=json` for structured JSON output (useful for production/log aggregation).
/// Default is human-readable text output.
///
/// # Example
///
/// ```rust,ignore
/// tool_common::init_tracing("agent_hub", 0)?;
/// ```
pub fn init_tracing(crate_name: &str, verbosity: u8) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("{}={}", crate_name, level).parse()?)
            .add_directive(format!("orchestrator={}", level).parse()?),
    };

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
