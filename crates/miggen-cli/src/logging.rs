use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise only warnings, or debug output with `--verbose`.
pub fn init(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    };

    // A subscriber may already be installed when embedded or under test.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
