//! Queue-decoupled dispatch
//!
//! Producers attach a [`QueueSink`] handler: it renders the record once,
//! prepares a copy and enqueues it without blocking. A [`QueueListener`]
//! owns a background thread that drains the [`LogQueue`] and hands each
//! record to its own handler set, so slow outputs never stall the threads
//! that log.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_logging::{Handler, LogQueue, Manager, NullSink, QueueListener, QueueSink};
//!
//! let queue = LogQueue::bounded(1024);
//! let listener = QueueListener::new(queue.clone(), vec![Arc::new(Handler::new(NullSink))]);
//! listener.start().unwrap();
//!
//! let manager = Manager::new();
//! manager.root().add_handler(Arc::new(Handler::new(QueueSink::new(queue))));
//! manager.root().warning("queued", ());
//!
//! listener.stop();
//! ```

use crate::core::{Delivery, Formatter, Handler, LoggerError, Record, Result, Sink};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// What travels through a [`LogQueue`].
#[derive(Debug)]
pub enum QueueItem {
    Record(Box<Record>),
    /// Tells the listener thread to exit
    Sentinel,
}

/// Multi-producer queue of prepared records. Clones share the same channel.
#[derive(Clone)]
pub struct LogQueue {
    sender: Sender<QueueItem>,
    receiver: Receiver<QueueItem>,
    capacity: Option<usize>,
}

impl LogQueue {
    /// Queue that rejects records once `capacity` are waiting.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity: Some(capacity),
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            capacity: None,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Enqueue without blocking.
    pub fn try_put(&self, item: QueueItem) -> Result<()> {
        match self.sender.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(LoggerError::QueueFull {
                capacity: self.capacity.unwrap_or_default(),
            }),
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::QueueClosed),
        }
    }

    /// Enqueue, waiting for room.
    pub fn put_blocking(&self, item: QueueItem) -> Result<()> {
        self.sender.send(item).map_err(|_| LoggerError::QueueClosed)
    }

    /// Wait for the next item.
    pub fn get(&self) -> Result<QueueItem> {
        self.receiver.recv().map_err(|_| LoggerError::QueueClosed)
    }

    pub fn try_get(&self) -> Option<QueueItem> {
        self.receiver.try_recv().ok()
    }
}

impl fmt::Debug for LogQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

/// Producer side: enqueues prepared records.
///
/// A full or closed queue is an emission error, reported through the
/// handler's error path and counted in [`QueueSink::rejected`].
#[derive(Debug)]
pub struct QueueSink {
    queue: LogQueue,
    rejected: u64,
}

impl QueueSink {
    #[must_use]
    pub fn new(queue: LogQueue) -> Self {
        Self { queue, rejected: 0 }
    }

    pub fn queue(&self) -> &LogQueue {
        &self.queue
    }

    /// Records the queue refused.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl Sink for QueueSink {
    fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery> {
        let text = formatter.format(record)?;
        let item = QueueItem::Record(Box::new(record.prepared(text)));
        if let Err(e) = self.queue.try_put(item) {
            self.rejected += 1;
            return Err(e);
        }
        Ok(Delivery::Written)
    }

    fn name(&self) -> &str {
        "queue"
    }
}

/// Consumer side: a background thread feeding queued records to handlers.
pub struct QueueListener {
    queue: LogQueue,
    handlers: Arc<Vec<Arc<Handler>>>,
    respect_handler_level: bool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl QueueListener {
    pub fn new(queue: LogQueue, handlers: Vec<Arc<Handler>>) -> Self {
        Self {
            queue,
            handlers: Arc::new(handlers),
            respect_handler_level: false,
            worker: Mutex::new(None),
        }
    }

    /// Skip handlers whose own level is above the record's
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn respect_handler_level(mut self, respect: bool) -> Self {
        self.respect_handler_level = respect;
        self
    }

    pub fn handlers(&self) -> &[Arc<Handler>] {
        &self.handlers
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Spawn the listener thread. Fails if it is already running.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(LoggerError::config(
                "queue listener",
                "Listener already started",
            ));
        }

        let queue = self.queue.clone();
        let handlers = Arc::clone(&self.handlers);
        let respect = self.respect_handler_level;
        let handle = thread::Builder::new()
            .name("log-queue-listener".to_string())
            .spawn(move || {
                while let Ok(QueueItem::Record(record)) = queue.get() {
                    Self::dispatch(&handlers, &record, respect);
                }
            })
            .map_err(|e| {
                LoggerError::io_operation("start queue listener", "Failed to spawn thread", e)
            })?;
        *worker = Some(handle);
        Ok(())
    }

    fn dispatch(handlers: &[Arc<Handler>], record: &Record, respect_handler_level: bool) {
        for handler in handlers {
            if respect_handler_level && record.level < handler.level() {
                continue;
            }
            handler.handle(record);
        }
    }

    /// Enqueue the sentinel and join the thread.
    ///
    /// Records queued before the sentinel are dispatched first. Calling
    /// `stop` on a listener that is not running does nothing.
    pub fn stop(&self) {
        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if let Err(e) = self.queue.put_blocking(QueueItem::Sentinel) {
            eprintln!("[LOGGER ERROR] Failed to signal queue listener: {}", e);
            return;
        }
        if let Err(e) = handle.join() {
            eprintln!("[LOGGER ERROR] Queue listener thread panicked: {:?}", e);
        }
    }
}

impl Drop for QueueListener {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for QueueListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueListener")
            .field("queue", &self.queue)
            .field("handlers", &self.handlers.len())
            .field("respect_handler_level", &self.respect_handler_level)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Level, Record, Value};
    use std::sync::mpsc;

    struct Collect(mpsc::Sender<String>);

    impl Sink for Collect {
        fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery> {
            let _ = self.0.send(formatter.format(record)?);
            Ok(Delivery::Written)
        }

        fn name(&self) -> &str {
            "collect"
        }
    }

    #[test]
    fn test_records_arrive_in_order() {
        let queue = LogQueue::unbounded();
        let (tx, rx) = mpsc::channel();
        let listener = QueueListener::new(queue.clone(), vec![Arc::new(Handler::new(Collect(tx)))]);
        listener.start().unwrap();
        assert!(listener.is_running());

        let producer = Handler::new(QueueSink::new(queue));
        for i in 0..20 {
            producer.handle(&Record::new("q", Level::INFO, format!("msg {}", i)));
        }
        listener.stop();
        assert!(!listener.is_running());

        let received: Vec<String> = rx.try_iter().collect();
        let expected: Vec<String> = (0..20).map(|i| format!("msg {}", i)).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn test_full_queue_is_reported_not_raised() {
        let queue = LogQueue::bounded(1);
        let producer = Handler::new(QueueSink::new(queue.clone()));
        assert!(producer.handle(&Record::new("q", Level::INFO, "kept")));
        assert!(producer.handle(&Record::new("q", Level::INFO, "lost")));

        assert_eq!(queue.len(), 1);
        assert_eq!(producer.metrics().error_count(), 1);
        assert_eq!(producer.with_sink(|s: &mut QueueSink| s.rejected()), Some(1));
    }

    #[test]
    fn test_prepared_record_carries_rendered_text() {
        let queue = LogQueue::unbounded();
        let producer = Handler::new(QueueSink::new(queue.clone()))
            .with_formatter(Formatter::new("%(levelname)s:%(message)s").unwrap());
        let record = Record::new("q", Level::WARNING, "value %d").with_args(vec![Value::from(7)]);
        producer.handle(&record);

        match queue.try_get() {
            Some(QueueItem::Record(queued)) => {
                assert_eq!(queued.msg, "WARNING:value 7");
                assert!(queued.args.is_empty());
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_respect_handler_level() {
        let queue = LogQueue::unbounded();
        let (tx, rx) = mpsc::channel();
        let strict = Arc::new(Handler::new(Collect(tx)).with_level(Level::ERROR));
        let listener = QueueListener::new(queue.clone(), vec![strict]).respect_handler_level(true);
        listener.start().unwrap();

        queue
            .try_put(QueueItem::Record(Box::new(Record::new("q", Level::INFO, "skip"))))
            .unwrap();
        queue
            .try_put(QueueItem::Record(Box::new(Record::new("q", Level::ERROR, "keep"))))
            .unwrap();
        listener.stop();

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["keep".to_string()]);
    }

    #[test]
    fn test_double_start_and_stop() {
        let listener = QueueListener::new(LogQueue::bounded(4), Vec::new());
        listener.start().unwrap();
        assert!(listener.start().is_err());
        listener.stop();
        listener.stop();
        listener.start().unwrap();
    }
}
