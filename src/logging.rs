//! Tracing subscriber setup for the binary. Library code only emits events.

use std::io;

use tracing_subscriber::EnvFilter;

use crate::domain::{LogFormat, LogLevel};

/// Filter for the given level; `RUST_LOG` wins when it is set and valid.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

/// Install the global subscriber, writing to stderr. A second call is a no-op.
pub fn init(level: LogLevel, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(io::stderr);

    let _ = match format {
        LogFormat::Tty => builder.with_ansi(true).try_init(),
        LogFormat::Logfmt => builder.with_ansi(false).with_target(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
}
