use tracing::Level;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FATIMA_LOG";

/// Diagnostics go to stderr, filtered by `FATIMA_LOG` (default `warn`).
pub fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
