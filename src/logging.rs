//! Logging setup and the diagnostic line sink handed to overlay components

use std::path::PathBuf;
use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "menu500-debug.log";

/// Initialise logging to `menu500-debug.log` next to the executable.
/// The level is `debug` when requested, `info` otherwise; `RUST_LOG`
/// overrides it only in debug mode.
///
/// Keep the returned guard alive for the lifetime of the process or the
/// file writer drops buffered lines.
pub fn init(debug: bool) -> Option<WorkerGuard> {
    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let dir = log_directory();
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}

fn log_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Optional "emit one diagnostic line" callback.
///
/// Components take one of these at construction. An empty sink is silent;
/// every line is also forwarded to `tracing` at debug level.
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Option<LineSink>,
}

impl Diagnostics {
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Sink that writes through `tracing` at info level
    pub fn tracing() -> Self {
        Self::new(|line| tracing::info!(target: "overlay", "{}", line))
    }

    pub fn emit(&self, line: &str) {
        tracing::debug!("{}", line);
        if let Some(sink) = &self.sink {
            sink(line);
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_missing_sink_is_silent() {
        Diagnostics::none().emit("nobody listens");
        Diagnostics::default().emit("still fine");
    }

    #[test]
    fn test_sink_receives_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = lines.clone();
        let diag = Diagnostics::new(move |line| captured.lock().push(line.to_string()));

        diag.emit("first");
        diag.clone().emit("second");

        assert_eq!(*lines.lock(), vec!["first".to_string(), "second".to_string()]);
    }
}
