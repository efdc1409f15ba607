use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, util::TryInitError};

/// Map the `-v` count to a level filter.
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install a stderr subscriber so log lines never mix with the report on stdout.
pub fn setup_logging(verbosity: u8, quiet: bool) -> Result<(), TryInitError> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(stderr_layer)
        .try_init()
}
