//! Handler output that discards everything
//!
//! Libraries attach one to their top-level logger so that records never
//! fall through to the last-resort handler when the application configures
//! nothing.

use crate::core::{Delivery, Formatter, Record, Result, Sink};

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn emit(&mut self, _record: &Record, _formatter: &Formatter) -> Result<Delivery> {
        Ok(Delivery::Written)
    }

    fn name(&self) -> &str {
        "null"
    }
}
