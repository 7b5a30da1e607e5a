//! Tracing initialization for the video generation MCP server.
//!
//! Filtering follows `RUST_LOG` (for example `RUST_LOG=videogen_mcp=debug`).
//! All output is written to stderr: in stdio mode stdout carries the MCP
//! protocol stream and must stay clean.
//!
//! ```no_run
//! use videogen_mcp_common::tracing::init_tracing;
//!
//! init_tracing();
//! tracing::info!("Server starting");
//! ```

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::Registry,
};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(default_level: &str) -> ::tracing::Dispatch {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    ::tracing::Dispatch::new(
        Registry::default()
            .with(env_filter(default_level))
            .with(fmt_layer),
    )
}

/// Initialize the global subscriber, defaulting to `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Initialize the global subscriber with a custom default level used when
/// `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_tracing_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize tracing, returning `Err(())` if a subscriber is already set.
pub fn try_init_tracing() -> Result<(), ()> {
    subscriber("info").try_init().map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_tracing_does_not_panic() {
        // Order-dependent across tests; only the absence of a panic matters.
        let _ = try_init_tracing();
        assert!(try_init_tracing().is_err());
    }

    #[test]
    fn test_env_filter_parses_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            drop(EnvFilter::new(level));
        }
        drop(EnvFilter::new("warn,videogen_mcp=debug"));
    }
}
