use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with console output and a daily-rolling JSON file in `log_dir`.
///
/// Keep the returned guard alive for the whole run so buffered lines are flushed.
pub fn init_logging(log_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let default_directive = if verbose { "sweetcat=debug" } else { "sweetcat=info" };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
    };

    if let Err(e) = fs::create_dir_all(log_dir) {
        // Console only; a missing log directory must not stop a catalog run.
        let _ = tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init();
        tracing::warn!("Could not create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, "sweetcat.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init_logging(&log_dir, true);

        assert!(guard.is_some());
        assert!(log_dir.is_dir());
        tracing::info!("logging initialised");
    }
}
