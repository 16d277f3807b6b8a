//! Logging for the loader and process-wide tracing setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Logger handed to the route loader.
pub trait LoadLogger: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, path: &Path, error: &dyn std::error::Error);
}

/// Forwards loader messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl LoadLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, path: &Path, error: &dyn std::error::Error) {
        tracing::error!(path = %path.display(), "Failed to load route file: {}", error);
    }
}

/// Installs the global subscriber: stdout, plus a daily rotated file when
/// `logging.directory` is configured. Keep the returned guards alive so the
/// non-blocking writers flush on shutdown.
pub fn init_tracing(cfg: &LoggingConfig) -> anyhow::Result<Vec<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into());
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let file_layer = match &cfg.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &cfg.file_name);
            let (file_nb, file_guard) = tracing_appender::non_blocking(appender);
            guards.push(file_guard);
            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(file_layer)
        .try_init()?;
    Ok(guards)
}
