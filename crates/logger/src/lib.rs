use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set: 0 = warnings, 1 = info, 2 = debug, 3+ = trace.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the stderr formatter. `RUST_LOG` wins over the verbosity flag.
/// Calling it again is a no-op.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    tracing::debug!(verbosity, "logging initialized");
}
