//! Log record: one emitted event
//!
//! A record is built once per logging call by the logger that owns the call
//! and then shared by reference with every handler on the dispatch path.
//! Argument expansion is deferred until the first [`Record::get_message`] and
//! cached afterwards; filters may attach extra attributes through
//! [`Record::set_extra`].

use super::callsite::CallSite;
use super::error::{LoggerError, Result};
use super::log_level::Level;
use super::printf::{self, Piece};
use super::value::Value;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::OnceLock;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Numeric id of the current thread, parsed once from `ThreadId`'s debug form
fn current_thread_id() -> u64 {
    THREAD_ID_CACHE.with(|cache| {
        if let Some(id) = cache.get() {
            return id;
        }
        let debug = format!("{:?}", std::thread::current().id());
        let id = debug
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or(0);
        cache.set(Some(id));
        id
    })
}

fn process_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "MainProcess".to_string())
    })
}

/// Attribute names a caller may not shadow with extras.
pub const RESERVED_ATTRIBUTES: &[&str] = &[
    "name",
    "msg",
    "args",
    "levelname",
    "levelno",
    "pathname",
    "filename",
    "module",
    "lineno",
    "funcName",
    "created",
    "msecs",
    "relativeCreated",
    "thread",
    "threadName",
    "process",
    "processName",
    "exc_info",
    "exc_text",
    "stack_info",
    "message",
    "asctime",
];

/// Unexpanded message arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Args {
    #[default]
    None,
    Positional(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Args {
    pub fn is_empty(&self) -> bool {
        match self {
            Args::None => true,
            Args::Positional(values) => values.is_empty(),
            Args::Mapping(map) => map.is_empty(),
        }
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Args::None => f.write_str("None"),
            Args::Positional(values) => {
                let parts: Vec<String> = values.iter().map(Value::repr).collect();
                write!(f, "({})", parts.join(", "))
            }
            Args::Mapping(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v.repr()))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Args::None
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Args::Positional(values)
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Args {
    fn from(values: [V; N]) -> Self {
        Args::Positional(values.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Args {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Args::Mapping(map)
    }
}

/// Captured error: type, message, cause chain and an optional backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcInfo {
    pub type_name: String,
    pub message: String,
    pub causes: Vec<String>,
    pub backtrace: Option<String>,
}

impl ExcInfo {
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            causes: Vec::new(),
            backtrace: None,
        }
    }

    /// Capture an error and its `source()` chain.
    #[must_use]
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            type_name: short_type_name(std::any::type_name::<E>()),
            message: err.to_string(),
            causes,
            backtrace: None,
        }
    }

    /// Attach a backtrace of the current thread.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backtrace(mut self) -> Self {
        self.backtrace = Some(Backtrace::force_capture().to_string());
        self
    }
}

impl fmt::Display for ExcInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

fn short_type_name(full: &str) -> String {
    match full.rsplit_once("::") {
        Some((_, last)) if !full.contains('<') => last.to_string(),
        _ => full.to_string(),
    }
}

/// Everything a record factory needs to build a record.
#[derive(Debug, Clone)]
pub struct RecordParts {
    pub name: String,
    pub level: Level,
    pub call_site: CallSite,
    pub msg: String,
    pub args: Args,
    pub exc_info: Option<ExcInfo>,
    pub stack_info: Option<String>,
    pub extra: BTreeMap<String, Value>,
    /// Registry start, the origin of `relativeCreated`
    pub start: DateTime<Utc>,
}

pub struct Record {
    pub name: String,
    pub msg: String,
    pub args: Args,
    pub level: Level,
    pub pathname: String,
    pub filename: String,
    pub module: String,
    pub lineno: u32,
    pub func_name: String,
    pub created: DateTime<Utc>,
    /// Milliseconds since the owning registry was created
    pub relative_created: f64,
    pub thread: u64,
    pub thread_name: Option<String>,
    pub process: u32,
    pub process_name: String,
    pub exc_info: Option<ExcInfo>,
    pub stack_info: Option<String>,
    exc_text: OnceLock<String>,
    message: OnceLock<String>,
    extra: RwLock<BTreeMap<String, Value>>,
}

impl Record {
    /// Minimal record stamped now, with no location and no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, level: Level, msg: impl Into<String>) -> Self {
        let now = Utc::now();
        Self::build(RecordParts {
            name: name.into(),
            level,
            call_site: CallSite::unknown(),
            msg: msg.into(),
            args: Args::None,
            exc_info: None,
            stack_info: None,
            extra: BTreeMap::new(),
            start: now,
        })
    }

    /// Build a record, rejecting extras that would shadow a built-in attribute.
    pub fn from_parts(parts: RecordParts) -> Result<Self> {
        if let Some(key) = parts
            .extra
            .keys()
            .find(|k| RESERVED_ATTRIBUTES.contains(&k.as_str()))
        {
            return Err(LoggerError::format(format!(
                "Attempt to overwrite '{}' in record",
                key
            )));
        }
        Ok(Self::build(parts))
    }

    fn build(parts: RecordParts) -> Self {
        let created = Utc::now();
        let relative_created = (created - parts.start)
            .num_microseconds()
            .map_or(0.0, |us| us as f64 / 1000.0);
        let current = std::thread::current();
        Self {
            filename: parts.call_site.filename().to_string(),
            module: parts.call_site.module_name().to_string(),
            pathname: parts.call_site.pathname,
            lineno: parts.call_site.lineno,
            func_name: parts.call_site.func_name,
            name: parts.name,
            msg: parts.msg,
            args: parts.args,
            level: parts.level,
            created,
            relative_created,
            thread: current_thread_id(),
            thread_name: current.name().map(String::from),
            process: std::process::id(),
            process_name: process_name().to_string(),
            exc_info: parts.exc_info,
            stack_info: parts.stack_info,
            exc_text: OnceLock::new(),
            message: OnceLock::new(),
            extra: RwLock::new(parts.extra),
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_args(mut self, args: impl Into<Args>) -> Self {
        self.args = args.into();
        self.message = OnceLock::new();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_exc_info(mut self, exc_info: ExcInfo) -> Self {
        self.exc_info = Some(exc_info);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_info(mut self, stack_info: impl Into<String>) -> Self {
        self.stack_info = Some(stack_info.into());
        self
    }

    /// The message with its arguments merged in, computed once.
    ///
    /// A record without arguments returns its template untouched, so literal
    /// `%` characters never trigger substitution.
    pub fn get_message(&self) -> Result<&str> {
        if let Some(message) = self.message.get() {
            return Ok(message);
        }
        let expanded = expand_message(&self.msg, &self.args)?;
        Ok(self.message.get_or_init(|| expanded))
    }

    pub fn levelname(&self) -> &'static str {
        self.level.name()
    }

    /// Millisecond part of the creation time
    pub fn msecs(&self) -> u32 {
        self.created.timestamp_subsec_millis()
    }

    /// Creation time as fractional seconds since the epoch
    pub fn created_secs(&self) -> f64 {
        self.created.timestamp_micros() as f64 / 1_000_000.0
    }

    pub fn exc_text(&self) -> Option<&str> {
        self.exc_text.get().map(String::as_str)
    }

    /// Cached exception text, rendering it with `render` on first use.
    pub fn exc_text_or_init(&self, render: impl FnOnce() -> String) -> &str {
        self.exc_text.get_or_init(render)
    }

    /// Attach an attribute after construction (typically from a filter).
    pub fn set_extra(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        if RESERVED_ATTRIBUTES.contains(&key.as_str()) {
            return Err(LoggerError::format(format!(
                "Attempt to overwrite '{}' in record",
                key
            )));
        }
        self.extra.write().insert(key, value.into());
        Ok(())
    }

    pub fn extra(&self, key: &str) -> Option<Value> {
        self.extra.read().get(key).cloned()
    }

    pub fn extra_keys(&self) -> Vec<String> {
        self.extra.read().keys().cloned().collect()
    }

    /// Look up an attribute by the name templates use.
    ///
    /// `message` is only present once [`Record::get_message`] succeeded and
    /// `asctime` is supplied by the formatter, never by the record.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "name" => Value::from(&self.name),
            "msg" => Value::from(&self.msg),
            "args" => Value::Str(self.args.to_string()),
            "levelname" => Value::from(self.levelname()),
            "levelno" => Value::from(self.level.value()),
            "pathname" => Value::from(&self.pathname),
            "filename" => Value::from(&self.filename),
            "module" => Value::from(&self.module),
            "lineno" => Value::from(self.lineno),
            "funcName" => Value::from(&self.func_name),
            "created" => Value::Float(self.created_secs()),
            "msecs" => Value::from(self.msecs()),
            "relativeCreated" => Value::Float(self.relative_created),
            "thread" => Value::from(self.thread),
            "threadName" => Value::from(self.thread_name.as_deref().unwrap_or("unnamed")),
            "process" => Value::from(self.process),
            "processName" => Value::from(&self.process_name),
            "exc_info" => Value::from(self.exc_info.as_ref().map(ToString::to_string)),
            "exc_text" => Value::from(self.exc_text().map(String::from)),
            "stack_info" => Value::from(self.stack_info.clone()),
            "message" => return self.message.get().map(Value::from),
            _ => return self.extra(name),
        };
        Some(value)
    }

    /// Copy suited to crossing a queue: the rendered text becomes the message,
    /// and arguments and exception data are dropped since the text already
    /// carries them.
    #[must_use]
    pub fn prepared(&self, formatted: String) -> Record {
        let mut copy = self.clone();
        copy.msg = formatted.clone();
        copy.args = Args::None;
        copy.exc_info = None;
        copy.stack_info = None;
        copy.exc_text = OnceLock::new();
        copy.message = OnceLock::from(formatted);
        copy
    }
}

impl Clone for Record {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            msg: self.msg.clone(),
            args: self.args.clone(),
            level: self.level,
            pathname: self.pathname.clone(),
            filename: self.filename.clone(),
            module: self.module.clone(),
            lineno: self.lineno,
            func_name: self.func_name.clone(),
            created: self.created,
            relative_created: self.relative_created,
            thread: self.thread,
            thread_name: self.thread_name.clone(),
            process: self.process,
            process_name: self.process_name.clone(),
            exc_info: self.exc_info.clone(),
            stack_info: self.stack_info.clone(),
            exc_text: self.exc_text.clone(),
            message: self.message.clone(),
            extra: RwLock::new(self.extra.read().clone()),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("pathname", &self.pathname)
            .field("lineno", &self.lineno)
            .field("msg", &self.msg)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// printf-style expansion of a message template against its arguments.
pub fn expand_message(msg: &str, args: &Args) -> Result<String> {
    match args {
        Args::Positional(values) if !values.is_empty() => expand_positional(msg, values),
        Args::Mapping(map) if !map.is_empty() => expand_mapping(msg, map),
        _ => Ok(msg.to_string()),
    }
}

fn expand_positional(msg: &str, values: &[Value]) -> Result<String> {
    let pieces = printf::parse(msg)?;
    let mut out = String::with_capacity(msg.len() + 16);
    let mut next = values.iter();
    for piece in &pieces {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Spec(conversion) => {
                if conversion.key.is_some() {
                    return Err(LoggerError::format("format requires a mapping"));
                }
                let value = next.next().ok_or_else(|| {
                    LoggerError::format("not enough arguments for format string")
                })?;
                out.push_str(&printf::render(conversion, value)?);
            }
        }
    }
    if next.next().is_some() {
        return Err(LoggerError::format(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(out)
}

fn expand_mapping(msg: &str, map: &BTreeMap<String, Value>) -> Result<String> {
    let pieces = printf::parse(msg)?;
    let mut out = String::with_capacity(msg.len() + 16);
    for piece in &pieces {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Spec(conversion) => {
                let key = conversion.key.as_deref().ok_or_else(|| {
                    LoggerError::format("mapping arguments need %(key) specs")
                })?;
                let value = map.get(key).ok_or_else(|| {
                    LoggerError::format(format!("no argument named '{}'", key))
                })?;
                out.push_str(&printf::render(conversion, value)?);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_args_render_literally() {
        let record = Record::new("app", Level::INFO, "100% done, %s untouched");
        assert_eq!(record.get_message().unwrap(), "100% done, %s untouched");
    }

    #[test]
    fn test_empty_argument_containers_render_literally() {
        let template = "50% of %s";
        for args in [Args::None, Args::Positional(Vec::new()), Args::Mapping(BTreeMap::new())] {
            assert_eq!(expand_message(template, &args).unwrap(), template);
        }
        let keyed = Args::Positional(vec![Value::from(1)]);
        assert!(expand_message("%(n)s", &keyed).unwrap_err().is_format_error());
    }

    #[test]
    fn test_positional_expansion() {
        let record = Record::new("app", Level::INFO, "user %s has %d items")
            .with_args(["alice".into(), Value::from(3)]);
        assert_eq!(record.get_message().unwrap(), "user alice has 3 items");
    }

    #[test]
    fn test_mapping_expansion() {
        let mut map = BTreeMap::new();
        map.insert("user".to_string(), Value::from("bob"));
        let record = Record::new("app", Level::INFO, "hello %(user)s").with_args(map);
        assert_eq!(record.get_message().unwrap(), "hello bob");
    }

    #[test]
    fn test_arity_errors() {
        let record = Record::new("app", Level::INFO, "%s and %s").with_args(["one"]);
        let err = record.get_message().unwrap_err();
        assert!(err.to_string().contains("not enough arguments"));

        let record = Record::new("app", Level::INFO, "%s").with_args(["one", "two"]);
        let err = record.get_message().unwrap_err();
        assert!(err.to_string().contains("not all arguments converted"));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_message_is_cached() {
        let record = Record::new("app", Level::INFO, "value %d").with_args([1]);
        let first = record.get_message().unwrap().as_ptr();
        let second = record.get_message().unwrap().as_ptr();
        assert_eq!(first, second);
        assert_eq!(record.attribute("message"), Some(Value::from("value 1")));
    }

    #[test]
    fn test_extras_cannot_shadow_builtins() {
        let record = Record::new("app", Level::INFO, "msg");
        assert!(record.set_extra("levelname", "x").is_err());
        record.set_extra("request_id", 7).unwrap();
        assert_eq!(record.attribute("request_id"), Some(Value::from(7)));
        assert_eq!(record.attribute("unknown"), None);

        let mut extra = BTreeMap::new();
        extra.insert("message".to_string(), Value::from("x"));
        let parts = RecordParts {
            name: "app".into(),
            level: Level::INFO,
            call_site: CallSite::unknown(),
            msg: "m".into(),
            args: Args::None,
            exc_info: None,
            stack_info: None,
            extra,
            start: Utc::now(),
        };
        assert!(Record::from_parts(parts).is_err());
    }

    #[test]
    fn test_builtin_attributes() {
        let record = Record::new("db.pool", Level::WARNING, "slow");
        assert_eq!(record.attribute("name"), Some(Value::from("db.pool")));
        assert_eq!(record.attribute("levelname"), Some(Value::from("WARNING")));
        assert_eq!(record.attribute("levelno"), Some(Value::from(30)));
        assert_eq!(record.attribute("exc_info"), Some(Value::None));
        assert_eq!(record.attribute("process"), Some(Value::from(std::process::id())));
    }

    #[test]
    fn test_exc_info_from_error_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = LoggerError::io_operation("opening", "config.json", io);
        let info = ExcInfo::from_error(&err);
        assert_eq!(info.type_name, "LoggerError");
        assert!(info.message.contains("config.json"));
        assert_eq!(info.causes, vec!["missing".to_string()]);
    }

    #[test]
    fn test_prepared_copy() {
        let record = Record::new("app", Level::ERROR, "failed %s")
            .with_args(["job"])
            .with_exc_info(ExcInfo::new("IoError", "disk"));
        let prepared = record.prepared("ERROR failed job".to_string());

        assert_eq!(prepared.msg, "ERROR failed job");
        assert!(prepared.args.is_empty());
        assert!(prepared.exc_info.is_none());
        assert_eq!(prepared.get_message().unwrap(), "ERROR failed job");
        assert_eq!(prepared.created, record.created);
    }
}
