pub mod settings;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Install the global tracing subscriber. `RUST_LOG` overrides the configured
/// level. When a log directory is configured, output goes to a daily-rolling
/// file; the returned guard must stay alive for the process lifetime.
pub fn init_logging(settings: &Settings) -> Option<WorkerGuard> {
    let level = if settings.logger.level.is_empty() {
        "info".to_string()
    } else {
        settings.logger.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if settings.logger.directory.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init();
        None
    } else {
        let appender =
            tracing_appender::rolling::daily(&settings.logger.directory, "crash-reports.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    }
}
