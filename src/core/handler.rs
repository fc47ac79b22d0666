//! Handler dispatch protocol
//!
//! A [`Handler`] owns everything common to all outputs: a level threshold,
//! an optional [`Formatter`], a [`Filterer`], counters, and a re-entrant lock
//! around its [`Sink`]. Concrete outputs only implement [`Sink`].
//!
//! Emission failures never reach the logging call site. They go through
//! [`Handler::handle_error`], which prints a best-effort block to standard
//! error and moves on to the next handler.

use super::error::{LoggerError, Result};
use super::filter::{Filter, Filterer};
use super::formatter::Formatter;
use super::log_level::Level;
use super::metrics::HandlerMetrics;
use super::record::Record;
use parking_lot::{ReentrantMutex, RwLock};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// What a sink did with a record it did not fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Written,
    /// Discarded on purpose, e.g. while a socket is disconnected
    Dropped,
}

/// Downcast support for [`Handler::with_sink`].
pub trait AsAny {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The output side of a handler.
///
/// `emit` runs with the handler's lock held, so implementations need no
/// locking of their own.
pub trait Sink: AsAny + Send {
    fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release OS resources. Called at most once by [`Handler::close`].
    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}

pub struct Handler {
    name: RwLock<Option<String>>,
    level: AtomicU32,
    formatter: RwLock<Option<Arc<Formatter>>>,
    filterer: Filterer,
    sink: ReentrantMutex<RefCell<Box<dyn Sink>>>,
    closed: AtomicBool,
    metrics: HandlerMetrics,
}

impl Handler {
    /// Handler with level NOTSET and the shared default formatter.
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        Self {
            name: RwLock::new(None),
            level: AtomicU32::new(Level::NOTSET.value()),
            formatter: RwLock::new(None),
            filterer: Filterer::new(),
            sink: ReentrantMutex::new(RefCell::new(Box::new(sink))),
            closed: AtomicBool::new(false),
            metrics: HandlerMetrics::new(),
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_level(self, level: Level) -> Self {
        self.set_level(level);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_formatter(self, formatter: Formatter) -> Self {
        self.set_formatter(Some(Arc::new(formatter)));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_filter(self, filter: Arc<dyn Filter>) -> Self {
        self.add_filter(filter);
        self
    }

    /// Configured name, falling back to the sink's own name.
    pub fn name(&self) -> String {
        if let Some(name) = self.name.read().as_ref() {
            return name.clone();
        }
        let guard = self.sink.lock();
        let name = match guard.try_borrow() {
            Ok(sink) => sink.name().to_string(),
            Err(_) => String::from("handler"),
        };
        name
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = Some(name.into());
    }

    #[inline]
    pub fn level(&self) -> Level {
        Level::new(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.value(), Ordering::Relaxed);
    }

    /// Own formatter, or the shared default.
    pub fn formatter(&self) -> Arc<Formatter> {
        match self.formatter.read().as_ref() {
            Some(formatter) => Arc::clone(formatter),
            None => Formatter::shared_default(),
        }
    }

    /// True when a formatter was set on this handler.
    pub fn has_formatter(&self) -> bool {
        self.formatter.read().is_some()
    }

    pub fn set_formatter(&self, formatter: Option<Arc<Formatter>>) {
        *self.formatter.write() = formatter;
    }

    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.filterer.add_filter(filter);
    }

    pub fn remove_filter(&self, filter: &Arc<dyn Filter>) {
        self.filterer.remove_filter(filter);
    }

    pub fn filterer(&self) -> &Filterer {
        &self.filterer
    }

    pub fn metrics(&self) -> &HandlerMetrics {
        &self.metrics
    }

    /// Render a record with this handler's formatter.
    pub fn format(&self, record: &Record) -> Result<String> {
        self.formatter().format(record)
    }

    /// Filter, then emit under the lock.
    ///
    /// Returns `false` only when a filter rejected the record; emission
    /// failures are reported through [`Handler::handle_error`] and still
    /// return `true`.
    pub fn handle(&self, record: &Record) -> bool {
        if !self.filterer.filter(record) {
            self.metrics.record_filtered();
            return false;
        }

        let formatter = self.formatter();
        let result = {
            let guard = self.sink.lock();
            let borrowed = guard.try_borrow_mut();
            match borrowed {
                Ok(mut sink) => catch_unwind(AssertUnwindSafe(|| sink.emit(record, &formatter)))
                    .unwrap_or_else(|payload| Err(LoggerError::Panicked(panic_message(payload)))),
                Err(_) => Err(LoggerError::ReentrantEmit {
                    handler: self.name.read().clone().unwrap_or_default(),
                }),
            }
        };

        match result {
            Ok(Delivery::Written) => {
                self.metrics.record_emitted();
            }
            Ok(Delivery::Dropped) | Err(LoggerError::ReentrantEmit { .. }) => {
                self.metrics.record_dropped();
            }
            Err(err) => self.handle_error(record, &err),
        }
        true
    }

    /// Best-effort report of an emission failure on standard error.
    ///
    /// No timestamp is rendered and nothing is logged, so a broken formatter
    /// cannot recurse into here.
    pub fn handle_error(&self, record: &Record, err: &LoggerError) {
        self.metrics.record_error();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "--- Logging error ---");
        let _ = writeln!(stderr, "{}", err);
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            let _ = writeln!(stderr, "Caused by: {}", cause);
            source = cause.source();
        }
        let _ = writeln!(
            stderr,
            "Logged from file {}, line {}",
            record.filename, record.lineno
        );
        let _ = writeln!(stderr, "Message: {:?}", record.msg);
        let _ = writeln!(stderr, "Arguments: {}", record.args);
    }

    pub fn flush(&self) -> Result<()> {
        let guard = self.sink.lock();
        let result = match guard.try_borrow_mut() {
            Ok(mut sink) => sink.flush(),
            Err(_) => Ok(()),
        };
        result
    }

    /// Flush and release the sink. Only the first call reaches the sink.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let guard = self.sink.lock();
        let result = match guard.try_borrow_mut() {
            Ok(mut sink) => sink.close(),
            Err(_) => Err(LoggerError::ReentrantEmit {
                handler: self.name.read().clone().unwrap_or_default(),
            }),
        };
        result
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run `f` against the sink if it is an `S`.
    pub fn with_sink<S: Sink + 'static, R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let guard = self.sink.lock();
        let mut borrowed = guard.try_borrow_mut().ok()?;
        let sink: &mut dyn Sink = &mut **borrowed;
        sink.as_any_mut().downcast_mut::<S>().map(f)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Handler {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.close() {
                eprintln!("[LOGGER ERROR] Failed to close handler on drop: {}", e);
            }
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::{OnceLock, Weak};

    #[derive(Default, Clone)]
    struct Capture {
        lines: Arc<Mutex<Vec<String>>>,
        closes: Arc<Mutex<usize>>,
    }

    impl Sink for Capture {
        fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery> {
            self.lines.lock().push(formatter.format(record)?);
            Ok(Delivery::Written)
        }

        fn close(&mut self) -> Result<()> {
            *self.closes.lock() += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    struct Failing;

    impl Sink for Failing {
        fn emit(&mut self, _record: &Record, _formatter: &Formatter) -> Result<Delivery> {
            Err(LoggerError::io_operation(
                "writing",
                "disk unplugged",
                std::io::Error::other("EIO"),
            ))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Panicking;

    impl Sink for Panicking {
        fn emit(&mut self, _record: &Record, _formatter: &Formatter) -> Result<Delivery> {
            panic!("sink exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn record(msg: &str) -> Record {
        Record::new("test", Level::INFO, msg)
    }

    #[test]
    fn test_handle_formats_and_emits() {
        let capture = Capture::default();
        let handler = Handler::new(capture.clone())
            .with_formatter(Formatter::new("%(levelname)s:%(message)s").unwrap());

        assert!(handler.handle(&record("hello")));
        assert_eq!(*capture.lines.lock(), vec!["INFO:hello".to_string()]);
        assert_eq!(handler.metrics().emitted_count(), 1);
        assert_eq!(handler.name(), "capture");
    }

    #[test]
    fn test_rejected_record_has_no_side_effect() {
        let capture = Capture::default();
        let handler = Handler::new(capture.clone()).with_filter(Arc::new(|_: &Record| false));

        assert!(!handler.handle(&record("hidden")));
        assert!(capture.lines.lock().is_empty());
        assert_eq!(handler.metrics().emitted_count(), 0);
    }

    #[test]
    fn test_emit_errors_are_contained() {
        let handler = Handler::new(Failing);
        assert!(handler.handle(&record("lost")));
        assert_eq!(handler.metrics().error_count(), 1);

        let handler = Handler::new(Panicking);
        assert!(handler.handle(&record("lost")));
        assert_eq!(handler.metrics().error_count(), 1);
    }

    #[test]
    fn test_format_errors_go_through_error_path() {
        let capture = Capture::default();
        let handler = Handler::new(capture.clone());
        let bad = Record::new("test", Level::INFO, "%d items").with_args(["many"]);

        assert!(handler.handle(&bad));
        assert!(capture.lines.lock().is_empty());
        assert_eq!(handler.metrics().error_count(), 1);
    }

    struct Reentrant {
        me: Arc<OnceLock<Weak<Handler>>>,
        writes: Arc<Mutex<usize>>,
    }

    impl Sink for Reentrant {
        fn emit(&mut self, record: &Record, _formatter: &Formatter) -> Result<Delivery> {
            *self.writes.lock() += 1;
            if let Some(handler) = self.me.get().and_then(Weak::upgrade) {
                handler.handle(record);
            }
            Ok(Delivery::Written)
        }

        fn name(&self) -> &str {
            "reentrant"
        }
    }

    #[test]
    fn test_reentrant_emit_is_dropped_without_deadlock() {
        let me = Arc::new(OnceLock::new());
        let writes = Arc::new(Mutex::new(0));
        let handler = Arc::new(Handler::new(Reentrant {
            me: Arc::clone(&me),
            writes: Arc::clone(&writes),
        }));
        let _ = me.set(Arc::downgrade(&handler));

        assert!(handler.handle(&record("once")));
        assert_eq!(*writes.lock(), 1);
        assert_eq!(handler.metrics().dropped_count(), 1);
        assert_eq!(handler.metrics().emitted_count(), 1);
    }

    #[test]
    fn test_close_reaches_sink_once() {
        let capture = Capture::default();
        let handler = Handler::new(capture.clone());
        handler.close().unwrap();
        handler.close().unwrap();
        drop(handler);
        assert_eq!(*capture.closes.lock(), 1);
    }

    #[test]
    fn test_with_sink_downcasts() {
        let handler = Handler::new(Capture::default());
        assert_eq!(handler.with_sink(|c: &mut Capture| c.name().to_string()), Some("capture".into()));
        assert!(handler.with_sink(|_: &mut Failing| ()).is_none());
    }
}
