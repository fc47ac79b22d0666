//! Core logger types and traits

pub mod callsite;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub(crate) mod printf;
pub mod record;
pub mod value;

pub use callsite::{CallSite, CallSiteResolver, CallerLocation, NoCallSite};
pub use error::{LoggerError, Result};
pub use filter::{Filter, Filterer, NameFilter};
pub use formatter::{Converter, Formatter, FormatterBuilder, Style, BASIC_FORMAT, DEFAULT_DATE_FORMAT};
pub use handler::{AsAny, Delivery, Handler, Sink};
pub use log_level::{level_name, Level, LevelSpec};
pub use logger::{DefaultRecordFactory, Event, Logger, Manager, RecordFactory, ROOT_NAME};
pub use metrics::HandlerMetrics;
pub use record::{expand_message, Args, ExcInfo, Record, RecordParts};
pub use value::Value;
