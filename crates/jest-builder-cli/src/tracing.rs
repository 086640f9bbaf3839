use std::io;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Installs the global subscriber.
///
/// ## Logging behaviour:
/// - Logs go to stderr so stdout only carries the build event.
/// - If stderr is a terminal, we use ansi colors. Otherwise, we do not.
/// - If the `JEST_BUILDER_LOG_VERBOSITY` env var is set, it will be used to
///   set the verbosity level. Otherwise, the default is `WARN`. See the
///   documentation on the RUST_LOG env var for syntax.
/// - If the verbosity argument is provided, it overrides the default global
///   log level, but not per-module settings.
pub fn init(verbosity: u8) {
    let level_override = match verbosity {
        0 => None,
        1 => Some(LevelFilter::INFO),
        2 => Some(LevelFilter::DEBUG),
        _ => Some(LevelFilter::TRACE),
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("JEST_BUILDER_LOG_VERBOSITY")
        .from_env_lossy();

    let filter = if let Some(max_level) = level_override {
        filter.add_directive(max_level.into())
    } else {
        filter
    };

    let stderr = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .with_filter(filter);

    Registry::default().with(stderr).init();
}
