use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging for the application.
///
/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
/// takes precedence; otherwise only warnings are shown unless `verbose`.
/// This must be called once at startup (in main.rs).
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "cert_tracker=debug,info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    debug!("Logging initialized");
}
