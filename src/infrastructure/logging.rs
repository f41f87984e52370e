use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::config::LoggingConfig;
use crate::domain::DomainError;

const LOG_TARGET: &str = "voice_translator_lib";
const LOG_FILE_PREFIX: &str = "voice-translator";

/// Default filter directive for the configured level.
fn filter_directive(level: &str) -> String {
    format!("{LOG_TARGET}={level},voice_translator={level},warn")
}

/// Initialize console logging and, when enabled, a daily-rotated JSON log file.
///
/// `RUST_LOG` overrides the configured level. Returns the file writer guard,
/// which must stay alive for buffered lines to be flushed.
pub fn init_logging(logs_dir: &Path, config: &LoggingConfig) -> Result<Option<WorkerGuard>, DomainError> {
    let level = config.level.as_str();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    // Console output goes to stderr so it never mixes with CLI output.
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_span_events(FmtSpan::NONE)
        .with_filter(env_filter);

    if !config.file_logging {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();
        tracing::debug!(level, "Logging initialized (console only)");
        return Ok(None);
    }

    fs::create_dir_all(logs_dir)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(config.max_files.max(1) as usize)
        .build(logs_dir)
        .map_err(|e| DomainError::Config(format!("Cannot open log file: {e}")))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(EnvFilter::new(filter_directive(level)));

    // try_init: a second initialization (tests, repeated runs) is a no-op.
    if tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(logs_dir = ?logs_dir, level, "Logging initialized with file output");
    }

    Ok(Some(guard))
}
