use std::{
    io,
    sync::{Arc, Mutex, Once},
};

use tracing::{
    Level,
    subscriber::{set_global_default, with_default},
};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{MakeWriter, format::FmtSpan},
    layer::SubscriberExt,
};

static INIT: Once = Once::new();

/// Installs a stdout logger for the test binary, later calls do nothing.
pub fn init_logger() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::filter::Targets::new().with_default(LevelFilter::TRACE);

        let std_logger = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .with_target(false)
            .without_time();

        let collector = tracing_subscriber::registry().with(std_logger).with(filter);

        set_global_default(collector).unwrap();
    });
}

/// Runs `f` on this thread with a logger that records events at `level` and above, returning
/// what was logged.
pub fn capture_logs<T>(level: Level, f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();

    let filter = tracing_subscriber::filter::Targets::new().with_default(level);
    let logger = tracing_subscriber::fmt::layer()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_target(false)
        .without_time();

    let collector = tracing_subscriber::registry().with(logger).with(filter);
    let result = with_default(collector, f);

    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self {
        self.clone()
    }
}
