//! Wires `zwave-logging`'s [`BaseLogger`] (a `&mut self` [`Logger`],
//! writing ANSI-colored lines to a terminal via `termcolor`) behind a
//! `Mutex` so it can be handed out as `Arc<dyn ImmutableLogger>` to the
//! gateway's per-component loggers, which are shared across the tokio
//! tasks in `main.rs`.

use std::sync::Mutex;

use termcolor::{ColorChoice, StandardStream};
use zwave_logging::loggers::base::BaseLogger;
use zwave_logging::{ImmutableLogger, LogFormatter, LogInfo, Logger, Loglevel};

pub struct StdoutLogger {
    inner: Mutex<BaseLogger>,
}

impl StdoutLogger {
    pub fn new(level: Loglevel) -> Self {
        Self {
            inner: Mutex::new(BaseLogger {
                level,
                writer: Box::new(StandardStream::stdout(ColorChoice::Auto)),
                formatter: Box::new(zwave_logging::formatters::DefaultFormatter::new()) as Box<dyn LogFormatter>,
            }),
        }
    }
}

impl ImmutableLogger for StdoutLogger {
    fn log(&self, log: LogInfo, level: Loglevel) {
        self.inner
            .lock()
            .expect("gateway stdout logger poisoned")
            .log(log, level);
    }

    fn log_level(&self) -> Loglevel {
        self.inner.lock().expect("gateway stdout logger poisoned").log_level()
    }

    fn set_log_level(&self, level: Loglevel) {
        self.inner
            .lock()
            .expect("gateway stdout logger poisoned")
            .set_log_level(level);
    }
}
