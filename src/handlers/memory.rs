//! Buffering in front of another handler

use crate::core::{Delivery, Formatter, Handler, Level, Record, Result, Sink};
use std::fmt;
use std::sync::Arc;

/// Holds records in memory and forwards them to a target handler in bulk.
///
/// The buffer is flushed when it reaches `capacity`, when a record at or
/// above `flush_level` arrives, on an explicit flush, and on close when
/// `flush_on_close` is set. Without a target, records stay buffered.
pub struct MemorySink {
    capacity: usize,
    flush_level: Level,
    target: Option<Arc<Handler>>,
    flush_on_close: bool,
    buffer: Vec<Record>,
}

impl MemorySink {
    pub fn new(capacity: usize, target: Option<Arc<Handler>>) -> Self {
        Self {
            capacity,
            flush_level: Level::ERROR,
            target,
            flush_on_close: true,
            buffer: Vec::with_capacity(capacity),
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn flush_level(mut self, level: Level) -> Self {
        self.flush_level = level;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn flush_on_close(mut self, flush_on_close: bool) -> Self {
        self.flush_on_close = flush_on_close;
        self
    }

    pub fn set_target(&mut self, target: Option<Arc<Handler>>) {
        self.target = target;
    }

    pub fn target(&self) -> Option<&Arc<Handler>> {
        self.target.as_ref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn should_flush(&self, record: &Record) -> bool {
        self.buffer.len() >= self.capacity || record.level >= self.flush_level
    }

    fn forward(&mut self) {
        if let Some(target) = &self.target {
            for record in self.buffer.drain(..) {
                target.handle(&record);
            }
        }
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, record: &Record, _formatter: &Formatter) -> Result<Delivery> {
        self.buffer.push(record.clone());
        if self.should_flush(record) {
            self.forward();
        }
        Ok(Delivery::Written)
    }

    fn flush(&mut self) -> Result<()> {
        self.forward();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.flush_on_close {
            self.forward();
        }
        self.target = None;
        self.buffer.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink")
            .field("capacity", &self.capacity)
            .field("flush_level", &self.flush_level)
            .field("has_target", &self.target.is_some())
            .field("flush_on_close", &self.flush_on_close)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
