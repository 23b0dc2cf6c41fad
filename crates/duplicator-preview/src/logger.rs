use tracing::{
    Level,
    subscriber::{SetGlobalDefaultError, set_global_default},
};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt};

const LOG_DIRECTORY: &str = "./logs";
const LOG_FILE: &str = "duplicator-preview.log";

/// Keeps the log writers flushing until dropped.
pub struct LoggerGuards {
    _std: WorkerGuard,
    _file: WorkerGuard,
}

pub fn setup_logger(debug: bool) -> Result<LoggerGuards, SetGlobalDefaultError> {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = tracing_subscriber::filter::Targets::new().with_default(level);

    // stdout logger
    let (std_writer, std_guard) = tracing_appender::non_blocking(std::io::stdout());
    let std_logger = tracing_subscriber::fmt::layer()
        .with_writer(std_writer)
        .with_ansi(false)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    // file logger
    let (file_writer, file_guard) =
        tracing_appender::non_blocking(rolling::daily(LOG_DIRECTORY, LOG_FILE));
    let file_logger = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    // Register loggers
    let collector = tracing_subscriber::registry()
        .with(std_logger)
        .with(file_logger)
        .with(filter);

    set_global_default(collector)?;

    Ok(LoggerGuards {
        _std: std_guard,
        _file: file_guard,
    })
}
