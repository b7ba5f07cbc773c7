//! Logging interface for the bridge.
//!
//! The bridge reports failures it swallows (teardown, stale callbacks, sink
//! errors) through a [`Logger`]. The default forwards to `tracing`.

use std::sync::Arc;

/// Logger interface for bridge components.
pub trait Logger: Send + Sync {
    fn error(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn info(&self, msg: &str);
    fn debug(&self, msg: &str);
}

/// Returns the default logger that uses the `tracing` crate.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, msg: &str) {
        tracing::error!(target: "aicall", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "aicall", "{}", msg);
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "aicall", "{}", msg);
    }

    fn debug(&self, msg: &str) {
        tracing::debug!(target: "aicall", "{}", msg);
    }
}

/// No-op logger that discards all messages.
pub struct NopLogger;

impl Logger for NopLogger {
    fn error(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
    };
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Logger that records every message, for assertions.
    #[derive(Default)]
    pub(crate) struct CapturingLogger {
        messages: Mutex<Vec<(&'static str, String)>>,
    }

    impl CapturingLogger {
        pub(crate) fn messages(&self) -> Vec<(&'static str, String)> {
            self.messages.lock().clone()
        }

        pub(crate) fn contains(&self, level: &str, needle: &str) -> bool {
            self.messages
                .lock()
                .iter()
                .any(|(l, m)| *l == level && m.contains(needle))
        }
    }

    impl Logger for CapturingLogger {
        fn error(&self, msg: &str) {
            self.messages.lock().push(("error", msg.to_string()));
        }
        fn warn(&self, msg: &str) {
            self.messages.lock().push(("warn", msg.to_string()));
        }
        fn info(&self, msg: &str) {
            self.messages.lock().push(("info", msg.to_string()));
        }
        fn debug(&self, msg: &str) {
            self.messages.lock().push(("debug", msg.to_string()));
        }
    }

    #[test]
    fn test_capturing_logger() {
        let logger = CapturingLogger::default();
        log_error!(logger, "failed to hang up: {}", "busy");
        log_warn!(logger, "dropping stale callback");
        log_info!(logger, "initEngine user={}", "u1");
        log_debug!(logger, "seq={}", 3);

        let msgs = logger.messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0], ("error", "failed to hang up: busy".to_string()));
        assert_eq!(msgs[2], ("info", "initEngine user=u1".to_string()));
        assert!(logger.contains("debug", "seq=3"));
    }

    #[test]
    fn test_nop_logger() {
        let logger = NopLogger;
        logger.error("should not panic");
        logger.debug("should not panic");
    }

    #[test]
    fn test_default_logger() {
        let logger = default_logger();
        logger.info("test default logger");
    }
}
