//! Per-component loggers for `zwave-gateway`: one thin wrapper per
//! control-plane subsystem (network management, resource directory, bridge,
//! top-level lifecycle), following
//! [`crate::loggers::controller::ControllerLogger`]'s shape rather than
//! inventing a new one. Each carries only the label its messages should be
//! tagged with; the actual sink (`Arc<dyn ImmutableLogger>`) is shared with
//! every other logger the process owns.

use crate::{ImmutableLogger, LogInfo};
use std::sync::Arc;
use zwave_core::log::{LogPayload, Loglevel};

/// Shared shape for the gateway's per-component loggers: a label plus the
/// usual level-gated message methods. Concrete loggers below are thin,
/// distinctly-typed wrappers around this so call sites can't mix up which
/// component produced a log line.
struct LabeledLogger {
    label: &'static str,
    inner: Arc<dyn ImmutableLogger>,
}

impl LabeledLogger {
    fn message(&self, message: impl Into<LogPayload>, level: Loglevel) {
        let log = LogInfo::builder()
            .label(self.label)
            .payload(message.into())
            .build();
        self.inner.log(log, level);
    }
}

macro_rules! gateway_logger {
    ($name:ident, $label:literal) => {
        pub struct $name {
            inner: LabeledLogger,
        }

        impl $name {
            pub fn new(sink: Arc<dyn ImmutableLogger>) -> Self {
                Self {
                    inner: LabeledLogger {
                        label: $label,
                        inner: sink,
                    },
                }
            }

            pub fn error(&self, message: impl Into<LogPayload>) {
                self.inner.message(message, Loglevel::Error);
            }

            pub fn warn(&self, message: impl Into<LogPayload>) {
                self.inner.message(message, Loglevel::Warn);
            }

            pub fn info(&self, message: impl Into<LogPayload>) {
                self.inner.message(message, Loglevel::Info);
            }

            pub fn verbose(&self, message: impl Into<LogPayload>) {
                self.inner.message(message, Loglevel::Verbose);
            }

            pub fn debug(&self, message: impl Into<LogPayload>) {
                self.inner.message(message, Loglevel::Debug);
            }

            pub fn level(&self) -> Loglevel {
                self.inner.inner.log_level()
            }
        }
    };
}

// Component G: network management state machine.
gateway_logger!(NmsLogger, "NMS");
// Component E: resource directory / probe engine.
gateway_logger!(RdLogger, "RD");
// Component F: bridge / virtual-node / association layer.
gateway_logger!(BridgeLogger, "BRIDGE");
// Top-level gateway lifecycle (init, config, fatal errors).
gateway_logger!(GatewayLogger, "GW");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        level: Loglevel,
        lines: Mutex<Vec<String>>,
    }

    impl ImmutableLogger for RecordingSink {
        fn log(&self, log: LogInfo, level: Loglevel) {
            if level > self.log_level() {
                return;
            }
            self.lines.lock().unwrap().push(format!("{:?}", log.label));
        }

        fn log_level(&self) -> Loglevel {
            self.level
        }

        fn set_log_level(&self, _level: Loglevel) {}
    }

    #[test]
    fn nms_logger_tags_its_own_label() {
        let sink = Arc::new(RecordingSink {
            level: Loglevel::Debug,
            lines: Mutex::new(Vec::new()),
        });
        let logger = NmsLogger::new(sink.clone());
        logger.info("node add started");
        assert_eq!(sink.lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn messages_above_configured_level_are_dropped() {
        let sink = Arc::new(RecordingSink {
            level: Loglevel::Warn,
            lines: Mutex::new(Vec::new()),
        });
        let logger = RdLogger::new(sink.clone());
        logger.debug("probe step");
        assert!(sink.lines.lock().unwrap().is_empty());
        logger.warn("probe failed");
        assert_eq!(sink.lines.lock().unwrap().len(), 1);
    }
}
