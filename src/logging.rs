use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "sqlchat.log";

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over the configured level. When file output is
/// enabled the returned guard must be kept alive until shutdown so buffered
/// lines get flushed.
pub fn init(config: &LoggingConfig) -> io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let console_layer = config.console_output.then(fmt::layer);

    let (file_layer, guard) = if config.file_output {
        let (writer, guard) = file_writer(Path::new(&config.file_path))?;
        let layer = fmt::layer().with_ansi(false).with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(guard)
}

fn file_writer(
    directory: &Path,
) -> io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if !directory.exists() {
        fs::create_dir_all(directory)?;
    }
    let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
