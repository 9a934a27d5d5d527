use tracing_subscriber::{prelude::*, EnvFilter};

/// Logs go to stderr and only when asked for (`RUST_LOG` or `PODENVS_FORCE_LOG`), stdout is
/// reserved for the rendered env.
pub(crate) fn init_tracing_registry() {
    let force_log = std::env::var("PODENVS_FORCE_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(false);

    if force_log || std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}
