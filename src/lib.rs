//! # Rust Logging
//!
//! A hierarchical logging framework: named loggers arranged in a dotted tree,
//! pluggable handlers and formatters, rotating files and queue-decoupled
//! dispatch.
//!
//! ## Features
//!
//! - **Logger hierarchy**: effective levels inherited from ancestors, cached
//!   and invalidated on every level change
//! - **Handlers**: stream, file (size, time or watched rollover), memory,
//!   socket, null and queue outputs, each with its own level and filters
//! - **Formatters**: `%`, `{}` and `$` template styles
//! - **Failure isolation**: a broken handler never reaches the logging call
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_logging::prelude::*;
//!
//! let manager = Manager::new();
//! let handler = Handler::new(StreamSink::stdout())
//!     .with_formatter(Formatter::new("%(levelname)s %(name)s: %(message)s").unwrap());
//! manager.root().add_handler(Arc::new(handler));
//!
//! let log = manager.get_logger("app.startup");
//! log.warning("%d workers failed to start", vec![Value::from(2)]);
//! ```

pub mod config;
pub mod core;
pub mod global;
pub mod handlers;
pub mod macros;

pub mod prelude {
    pub use crate::config::{basic_config, dict_config, BasicConfig, LoggingConfig};
    pub use crate::core::{
        Event, Filter, Formatter, Handler, Level, Logger, LoggerError, Manager, NameFilter,
        Record, Result, Sink, Style, Value,
    };
    pub use crate::handlers::{
        FileSink, LogQueue, MemorySink, NullSink, QueueListener, QueueSink, SizeRotation,
        StreamSink, TimedRotation, When,
    };
}

pub use crate::core::{
    level_name, Args, AsAny, CallSite, CallSiteResolver, CallerLocation, Converter, Delivery,
    Event, ExcInfo, Filter, Filterer, Formatter, FormatterBuilder, Handler, HandlerMetrics, Level,
    Logger, LoggerError, Manager, NameFilter, NoCallSite, Record, RecordFactory, RecordParts,
    Result, Sink, Style, Value,
};
pub use handlers::{
    gzip_namer, gzip_rotator, Clock, FileMode, FileSink, FileSinkBuilder, LogFile, LogQueue,
    ManualClock, MemorySink, NoRollover, NullSink, QueueItem, QueueListener, QueueSink,
    RolloverPolicy, SizeRotation, SocketSink, StreamSink, SystemClock, TimedRotation, WatchedFile,
    When,
};
