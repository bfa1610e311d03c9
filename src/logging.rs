use tracing_subscriber::EnvFilter;

/// Send `tracing` output to stderr, filtered by `RUST_LOG` or `default`.
///
/// Stdout stays reserved for reports and tool output, which other processes
/// read.
pub fn init(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
