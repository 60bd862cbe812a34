use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::ConfigError;
use crate::settings::{LogFormat, Logging};

/// Installs the global tracing subscriber described by `settings`.
///
/// `RUST_LOG` takes precedence over `settings.level`. When a log directory is
/// configured, output goes to a daily-rolling file and the returned guard must be
/// held until shutdown so buffered lines are flushed.
pub fn init_tracing(settings: &Logging) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ConfigError::Logging(format!("invalid filter '{}': {}", settings.level, e)))?;

    let (writer, guard) = match &settings.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &settings.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(settings.directory.is_none());

    let installed = match settings.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(level = %settings.level, format = ?settings.format, "Tracing initialised.");
    Ok(guard)
}
