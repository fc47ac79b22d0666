//! Declarative configuration
//!
//! [`LoggingConfig`] describes formatters, filters, handlers and loggers by
//! name; [`dict_config`] builds them with the public constructors and wires
//! them into a [`Manager`]. [`basic_config`] is the one-call setup for the
//! root logger.
//!
//! # Example
//!
//! ```
//! use rust_logging::config::{dict_config, LoggingConfig};
//! use rust_logging::Manager;
//!
//! let config = LoggingConfig::from_json(r#"{
//!     "version": 1,
//!     "formatters": { "brief": { "format": "%(levelname)s %(message)s" } },
//!     "handlers": { "console": { "class": "stream", "formatter": "brief", "stream": "stdout" } },
//!     "root": { "level": "INFO", "handlers": ["console"] }
//! }"#).unwrap();
//!
//! let manager = Manager::new();
//! let _configured = dict_config(&manager, &config).unwrap();
//! manager.get_logger("app").info("configured", ());
//! ```

use crate::core::{
    Filter, Formatter, Handler, Level, Logger, LoggerError, Manager, NameFilter, Result, Style,
    Value,
};
use crate::handlers::{
    FileMode, FileSink, LogQueue, MemorySink, NullSink, QueueListener, QueueSink, SizeRotation,
    SocketSink, StreamSink, TimedRotation, WatchedFile, When,
};
use chrono::NaiveTime;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Held for the whole of a configuration call, so concurrent callers never
/// both see an empty root and both install handlers.
static CONFIGURE_LOCK: Mutex<()> = Mutex::new(());

fn default_true() -> bool {
    true
}

fn default_interval() -> u32 {
    1
}

/// Version 1 configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub version: u32,
    #[serde(default)]
    pub formatters: BTreeMap<String, FormatterConfig>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterConfig>,
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerConfig>,
    #[serde(default)]
    pub root: Option<LoggerConfig>,
    /// Disable loggers that exist but are not named here
    #[serde(default = "default_true")]
    pub disable_existing_loggers: bool,
}

impl LoggingConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| LoggerError::config_caused("config", "invalid document", e.into()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatterConfig {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub datefmt: Option<String>,
    #[serde(default)]
    pub style: Style,
    #[serde(default = "default_true")]
    pub validate: bool,
    #[serde(default)]
    pub defaults: HashMap<String, Value>,
    #[serde(default)]
    pub utc: bool,
}

impl FormatterConfig {
    pub fn build(&self) -> Result<Formatter> {
        let mut builder = Formatter::builder()
            .style(self.style)
            .validate(self.validate)
            .utc(self.utc)
            .defaults(self.defaults.clone());
        if let Some(format) = &self.format {
            builder = builder.format(format.clone());
        }
        if let Some(datefmt) = &self.datefmt {
            builder = builder.datefmt(datefmt.clone());
        }
        builder.build()
    }
}

/// A [`NameFilter`] on `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum StreamTarget {
    #[default]
    #[serde(rename = "stderr", alias = "ext://sys.stderr")]
    Stderr,
    #[serde(rename = "stdout", alias = "ext://sys.stdout")]
    Stdout,
}

/// Handler output selected by the `class` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum HandlerKind {
    Stream {
        #[serde(default)]
        stream: StreamTarget,
    },
    File {
        filename: PathBuf,
        #[serde(default)]
        mode: FileMode,
        #[serde(default)]
        delay: bool,
    },
    WatchedFile {
        filename: PathBuf,
        #[serde(default)]
        mode: FileMode,
        #[serde(default)]
        delay: bool,
    },
    RotatingFile {
        filename: PathBuf,
        #[serde(default)]
        max_bytes: u64,
        #[serde(default)]
        backup_count: usize,
        #[serde(default)]
        delay: bool,
        #[serde(default)]
        compress: bool,
    },
    TimedRotatingFile {
        filename: PathBuf,
        when: String,
        #[serde(default = "default_interval")]
        interval: u32,
        #[serde(default)]
        backup_count: usize,
        #[serde(default)]
        utc: bool,
        #[serde(default)]
        at_time: Option<NaiveTime>,
        #[serde(default)]
        delay: bool,
        #[serde(default)]
        compress: bool,
    },
    Null,
    Memory {
        capacity: usize,
        #[serde(default)]
        flush_level: Option<Level>,
        #[serde(default)]
        target: Option<String>,
        #[serde(default = "default_true")]
        flush_on_close: bool,
    },
    Socket {
        host: String,
        port: u16,
    },
    Queue {
        /// Unbounded when absent
        #[serde(default)]
        capacity: Option<usize>,
        handlers: Vec<String>,
        #[serde(default)]
        respect_handler_level: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    #[serde(flatten)]
    pub kind: HandlerKind,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub formatter: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub propagate: Option<bool>,
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}

/// What [`dict_config`] built.
///
/// Queue listeners run until this value (or the listener) is dropped.
#[derive(Debug, Default)]
pub struct Configured {
    pub handlers: BTreeMap<String, Arc<Handler>>,
    pub listeners: Vec<QueueListener>,
}

impl Configured {
    pub fn handler(&self, name: &str) -> Option<&Arc<Handler>> {
        self.handlers.get(name)
    }
}

struct Wiring {
    formatters: BTreeMap<String, Arc<Formatter>>,
    filters: BTreeMap<String, Arc<dyn Filter>>,
    built: Configured,
}

impl Wiring {
    fn filters_named(&self, component: &str, names: &[String]) -> Result<Vec<Arc<dyn Filter>>> {
        names
            .iter()
            .map(|name| {
                self.filters.get(name).cloned().ok_or_else(|| {
                    LoggerError::config(component, format!("Unknown filter '{}'", name))
                })
            })
            .collect()
    }

    fn handlers_named(&self, component: &str, names: &[String]) -> Result<Vec<Arc<Handler>>> {
        names
            .iter()
            .map(|name| {
                self.built.handlers.get(name).cloned().ok_or_else(|| {
                    LoggerError::config(component, format!("Unknown handler '{}'", name))
                })
            })
            .collect()
    }

    /// Handlers this one refers to that are not built yet.
    fn pending_references(&self, config: &HandlerConfig) -> bool {
        match &config.kind {
            HandlerKind::Memory {
                target: Some(target),
                ..
            } => !self.built.handlers.contains_key(target),
            HandlerKind::Queue { handlers, .. } => {
                handlers.iter().any(|h| !self.built.handlers.contains_key(h))
            }
            _ => false,
        }
    }

    fn build_handler(&mut self, name: &str, config: &HandlerConfig) -> Result<Arc<Handler>> {
        let component = format!("handler '{}'", name);
        let wrap = |e: LoggerError| LoggerError::config_caused(component.clone(), "build failed", e);

        let handler = match &config.kind {
            HandlerKind::Stream { stream } => match stream {
                StreamTarget::Stderr => Handler::new(StreamSink::stderr()),
                StreamTarget::Stdout => Handler::new(StreamSink::stdout()),
            },
            HandlerKind::File {
                filename,
                mode,
                delay,
            } => Handler::new(
                FileSink::builder(filename)
                    .mode(*mode)
                    .delay(*delay)
                    .build()
                    .map_err(wrap)?,
            ),
            HandlerKind::WatchedFile {
                filename,
                mode,
                delay,
            } => Handler::new(
                FileSink::builder(filename)
                    .mode(*mode)
                    .delay(*delay)
                    .policy(WatchedFile::new())
                    .build()
                    .map_err(wrap)?,
            ),
            HandlerKind::RotatingFile {
                filename,
                max_bytes,
                backup_count,
                delay,
                compress,
            } => Handler::new(
                FileSink::builder(filename)
                    .delay(*delay)
                    .compress(*compress)
                    .policy(SizeRotation::new(*max_bytes, *backup_count))
                    .build()
                    .map_err(wrap)?,
            ),
            HandlerKind::TimedRotatingFile {
                filename,
                when,
                interval,
                backup_count,
                utc,
                at_time,
                delay,
                compress,
            } => {
                let when: When = when.parse().map_err(wrap)?;
                let mut policy = TimedRotation::new(when, *interval, *backup_count)
                    .map_err(wrap)?
                    .utc(*utc);
                if let Some(at) = at_time {
                    policy = policy.at_time(*at);
                }
                Handler::new(
                    FileSink::builder(filename)
                        .delay(*delay)
                        .compress(*compress)
                        .policy(policy)
                        .build()
                        .map_err(wrap)?,
                )
            }
            HandlerKind::Null => Handler::new(NullSink),
            HandlerKind::Memory {
                capacity,
                flush_level,
                target,
                flush_on_close,
            } => {
                let target = match target {
                    Some(target) => Some(
                        self.handlers_named(&component, std::slice::from_ref(target))?
                            .remove(0),
                    ),
                    None => None,
                };
                Handler::new(
                    MemorySink::new(*capacity, target)
                        .flush_level(flush_level.unwrap_or(Level::ERROR))
                        .flush_on_close(*flush_on_close),
                )
            }
            HandlerKind::Socket { host, port } => Handler::new(SocketSink::new(host.clone(), *port)),
            HandlerKind::Queue {
                capacity,
                handlers,
                respect_handler_level,
            } => {
                let targets = self.handlers_named(&component, handlers)?;
                let queue = capacity.map_or_else(LogQueue::unbounded, LogQueue::bounded);
                let listener = QueueListener::new(queue.clone(), targets)
                    .respect_handler_level(*respect_handler_level);
                listener.start().map_err(wrap)?;
                self.built.listeners.push(listener);
                Handler::new(QueueSink::new(queue))
            }
        };

        handler.set_name(name);
        if let Some(level) = config.level {
            handler.set_level(level);
        }
        if let Some(formatter) = &config.formatter {
            let formatter = self.formatters.get(formatter).cloned().ok_or_else(|| {
                LoggerError::config(component.clone(), format!("Unknown formatter '{}'", formatter))
            })?;
            handler.set_formatter(Some(formatter));
        }
        for filter in self.filters_named(&component, &config.filters)? {
            handler.add_filter(filter);
        }
        Ok(Arc::new(handler))
    }

    fn configure_logger(&self, logger: &Logger, config: &LoggerConfig) -> Result<()> {
        let component = format!("logger '{}'", logger.name());
        let handlers = self.handlers_named(&component, &config.handlers)?;
        let filters = self.filters_named(&component, &config.filters)?;
        if let Some(level) = config.level {
            logger.set_level(level);
        }
        logger.clear_handlers();
        for handler in handlers {
            logger.add_handler(handler);
        }
        for filter in filters {
            logger.add_filter(filter);
        }
        Ok(())
    }
}

/// Build everything `config` describes and wire it into `manager`.
pub fn dict_config(manager: &Manager, config: &LoggingConfig) -> Result<Configured> {
    let _guard = CONFIGURE_LOCK.lock();
    if config.version != 1 {
        return Err(LoggerError::config(
            "config",
            format!("Unsupported version: {}", config.version),
        ));
    }

    let mut wiring = Wiring {
        formatters: BTreeMap::new(),
        filters: BTreeMap::new(),
        built: Configured::default(),
    };

    for (name, formatter) in &config.formatters {
        let built = formatter.build().map_err(|e| {
            LoggerError::config_caused(format!("formatter '{}'", name), "build failed", e)
        })?;
        wiring.formatters.insert(name.clone(), Arc::new(built));
    }
    for (name, filter) in &config.filters {
        let filter: Arc<dyn Filter> = Arc::new(NameFilter::new(filter.name.clone()));
        wiring.filters.insert(name.clone(), filter);
    }

    // handlers pointing at handlers not built yet wait for a second pass
    let mut deferred = Vec::new();
    for (name, handler) in &config.handlers {
        if wiring.pending_references(handler) {
            deferred.push((name, handler));
            continue;
        }
        let built = wiring.build_handler(name, handler)?;
        wiring.built.handlers.insert(name.clone(), built);
    }
    for (name, handler) in deferred {
        let built = wiring.build_handler(name, handler)?;
        wiring.built.handlers.insert(name.clone(), built);
    }

    let mut existing = manager.logger_names();
    let mut children = Vec::new();
    for (name, logger_config) in &config.loggers {
        // children count even when `name` itself is still a placeholder
        let prefix = format!("{}.", name);
        children.extend(existing.iter().filter(|n| n.starts_with(&prefix)).cloned());
        existing.retain(|n| n != name);
        let logger = manager.get_logger(name);
        wiring.configure_logger(&logger, logger_config)?;
        logger.set_disabled(false);
        if let Some(propagate) = logger_config.propagate {
            logger.set_propagate(propagate);
        }
    }

    for name in existing {
        let logger = manager.get_logger(&name);
        if children.contains(&name) {
            logger.set_level(Level::NOTSET);
            logger.clear_handlers();
            logger.set_propagate(true);
        } else if config.disable_existing_loggers {
            logger.set_disabled(true);
        }
    }

    if let Some(root) = &config.root {
        wiring.configure_logger(&manager.root(), root)?;
    }
    Ok(wiring.built)
}

/// One-shot setup of the root logger.
///
/// Does nothing when the root already has handlers, unless `force` is set,
/// in which case those handlers are removed and closed first.
#[derive(Default)]
pub struct BasicConfig {
    filename: Option<PathBuf>,
    filemode: FileMode,
    stream: Option<Box<dyn Write + Send>>,
    handlers: Option<Vec<Arc<Handler>>>,
    format: Option<String>,
    datefmt: Option<String>,
    style: Style,
    level: Option<Level>,
    force: bool,
}

impl BasicConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn filemode(mut self, mode: FileMode) -> Self {
        self.filemode = mode;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn stream<W: Write + Send + 'static>(mut self, stream: W) -> Self {
        self.stream = Some(Box::new(stream));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn handlers(mut self, handlers: Vec<Arc<Handler>>) -> Self {
        self.handlers = Some(handlers);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn datefmt(mut self, datefmt: impl Into<String>) -> Self {
        self.datefmt = Some(datefmt.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

pub fn basic_config(manager: &Manager, config: BasicConfig) -> Result<()> {
    let _guard = CONFIGURE_LOCK.lock();
    let root = manager.root();
    if config.force {
        for handler in root.clear_handlers() {
            if let Err(e) = handler.close() {
                eprintln!("[LOGGER ERROR] Failed to close handler '{}': {}", handler.name(), e);
            }
        }
    }
    if !root.handlers().is_empty() {
        return Ok(());
    }

    if config.handlers.is_some() && (config.stream.is_some() || config.filename.is_some()) {
        return Err(LoggerError::config(
            "basic config",
            "'stream' or 'filename' should not be specified together with 'handlers'",
        ));
    }
    if config.stream.is_some() && config.filename.is_some() {
        return Err(LoggerError::config(
            "basic config",
            "'stream' and 'filename' should not be specified together",
        ));
    }

    let handlers = match (config.handlers, config.filename, config.stream) {
        (Some(handlers), _, _) => handlers,
        (None, Some(filename), _) => {
            let sink = FileSink::builder(filename).mode(config.filemode).build()?;
            vec![Arc::new(Handler::new(sink))]
        }
        (None, None, Some(stream)) => vec![Arc::new(Handler::new(StreamSink::new(stream)))],
        (None, None, None) => vec![Arc::new(Handler::new(StreamSink::stderr()))],
    };

    let mut builder = Formatter::builder()
        .style(config.style)
        .format(config.format.unwrap_or_else(|| config.style.basic_format().to_string()));
    if let Some(datefmt) = config.datefmt {
        builder = builder.datefmt(datefmt);
    }
    let formatter = Arc::new(
        builder
            .build()
            .map_err(|e| LoggerError::config_caused("basic config", "invalid format", e))?,
    );

    for handler in handlers {
        if !handler.has_formatter() {
            handler.set_formatter(Some(Arc::clone(&formatter)));
        }
        root.add_handler(handler);
    }
    if let Some(level) = config.level {
        root.set_level(level);
    }
    Ok(())
}
