//! Concrete handler outputs
//!
//! Each type here implements [`Sink`](crate::core::Sink) and is wrapped in a
//! [`Handler`](crate::core::Handler) to be attached to loggers.

pub mod compress;
pub mod file;
pub mod memory;
pub mod null;
pub mod queue;
pub mod socket;
pub mod stream;
pub mod timed;

pub use compress::{gzip_namer, gzip_rotator};
pub use file::{
    FileMode, FileSink, FileSinkBuilder, LogFile, Namer, NoRollover, RolloverPolicy, Rotator,
    SizeRotation, WatchedFile,
};
pub use memory::MemorySink;
pub use null::NullSink;
pub use queue::{LogQueue, QueueItem, QueueListener, QueueSink};
pub use socket::SocketSink;
pub use stream::StreamSink;
pub use timed::{Clock, ManualClock, SystemClock, TimedRotation, When};
