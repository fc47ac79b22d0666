//! Logging macros that capture the call site.
//!
//! The macros record `file!()`, `line!()` and `module_path!()` and only
//! convert their arguments when the logger is enabled for the level.
//! Messages use printf-style placeholders, expanded lazily by the record.
//!
//! # Examples
//!
//! ```
//! use rust_logging::{info, warning, Manager};
//!
//! let manager = Manager::new();
//! let logger = manager.get_logger("server");
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! warning!(logger, "Port %d already in use, retrying", port);
//! ```

/// Log at an explicit level.
///
/// ```
/// # use rust_logging::{Level, Manager};
/// # let logger = Manager::new().get_logger("m");
/// use rust_logging::log;
/// log!(logger, Level::ERROR, "Error code: %d", 500);
/// log!(logger, Level::new(25), "custom level");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        let logger = &$logger;
        let level: $crate::Level = $level;
        if logger.is_enabled_for(level) {
            let event = $crate::Event::new($msg)
                .args(::std::vec::Vec::<$crate::Value>::from([$($crate::Value::from($arg)),*]))
                .call_site(
                    $crate::CallSite::new(file!(), line!()).with_module(module_path!()),
                );
            if let Err(e) = logger.log_event(level, event) {
                eprintln!("[LOGGER ERROR] Failed to build record: {}", e);
            }
        }
    }};
}

/// Log at DEBUG.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEBUG, $($arg)+)
    };
}

/// Log at INFO.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::INFO, $($arg)+)
    };
}

/// Log at WARNING.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARNING, $($arg)+)
    };
}

/// Log at ERROR.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ERROR, $($arg)+)
    };
}

/// Log at CRITICAL.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::CRITICAL, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Delivery, Formatter, Handler, Level, Manager, Record, Result, Sink};
    use parking_lot::Mutex;
    use std::cell::Cell;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<(String, u32, String)>>>);

    impl Sink for Capture {
        fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery> {
            self.0
                .lock()
                .push((formatter.format(record)?, record.lineno, record.module.clone()));
            Ok(Delivery::Written)
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    #[test]
    fn test_macros_capture_call_site() {
        let manager = Manager::new();
        let logger = manager.get_logger("macros");
        let seen = Capture::default();
        logger.add_handler(Arc::new(Handler::new(seen.clone())));

        let line = line!() + 1;
        crate::warning!(logger, "%s has %d items", "cart", 3);
        crate::error!(logger, "plain");

        let seen = seen.0.lock();
        assert_eq!(seen[0].0, "cart has 3 items");
        assert_eq!(seen[0].1, line);
        assert_eq!(seen[0].2, module_path!());
        assert_eq!(seen[1].0, "plain");
    }

    #[test]
    fn test_disabled_level_skips_argument_conversion() {
        let manager = Manager::new();
        let logger = manager.get_logger("lazy");
        let seen = Capture::default();
        logger.add_handler(Arc::new(Handler::new(seen.clone())));

        let evaluated = Cell::new(false);
        let probe = || {
            evaluated.set(true);
            1
        };
        crate::debug!(logger, "value %d", probe());
        assert!(!evaluated.get());
        crate::log!(logger, Level::CRITICAL, "value %d", probe());
        assert!(evaluated.get());
        assert_eq!(seen.0.lock().len(), 1);
    }
}
