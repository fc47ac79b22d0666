//! Logger hierarchy and registry
//!
//! A [`Manager`] owns every [`Logger`] by name. Dotted names form a tree:
//! `"a.b"` is a child of `"a"`, and every tree hangs off the root logger.
//! Asking for `"a.b.c"` before `"a"` exists leaves placeholder nodes behind
//! which are repaired as soon as the real ancestor is created.
//!
//! # Examples
//!
//! ```
//! use rust_logging::{Level, Manager};
//!
//! let manager = Manager::new();
//! let db = manager.get_logger("app.db");
//! manager.get_logger("app").set_level(Level::DEBUG);
//!
//! assert_eq!(db.effective_level(), Level::DEBUG);
//! assert!(db.is_enabled_for(Level::DEBUG));
//! ```

use super::callsite::{CallSite, CallSiteResolver, CallerLocation};
use super::error::{LoggerError, Result};
use super::filter::{Filter, Filterer};
use super::handler::Handler;
use super::log_level::Level;
use super::record::{Args, ExcInfo, Record, RecordParts};
use super::value::Value;
use crate::handlers::StreamSink;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::backtrace::Backtrace;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Name of the root logger.
pub const ROOT_NAME: &str = "root";

/// Builds records for a registry. Install with [`Manager::set_record_factory`].
pub trait RecordFactory: Send + Sync {
    fn make(&self, parts: RecordParts) -> Result<Record>;
}

impl<F> RecordFactory for F
where
    F: Fn(RecordParts) -> Result<Record> + Send + Sync,
{
    fn make(&self, parts: RecordParts) -> Result<Record> {
        self(parts)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRecordFactory;

impl RecordFactory for DefaultRecordFactory {
    fn make(&self, parts: RecordParts) -> Result<Record> {
        Record::from_parts(parts)
    }
}

/// Registry-wide state every logger reads on the hot path.
struct Hierarchy {
    /// Bumped whenever any level or parent link changes
    epoch: AtomicU64,
    disable: AtomicU32,
    record_factory: RwLock<Arc<dyn RecordFactory>>,
    resolver: RwLock<Arc<dyn CallSiteResolver>>,
    last_resort: RwLock<Option<Arc<Handler>>>,
    warned_no_handlers: AtomicBool,
    start: DateTime<Utc>,
}

impl Hierarchy {
    fn new() -> Self {
        let last_resort = Handler::new(StreamSink::stderr())
            .with_level(Level::WARNING)
            .with_name("last resort");
        Self {
            epoch: AtomicU64::new(0),
            disable: AtomicU32::new(0),
            record_factory: RwLock::new(Arc::new(DefaultRecordFactory)),
            resolver: RwLock::new(Arc::new(CallerLocation)),
            last_resort: RwLock::new(Some(Arc::new(last_resort))),
            warned_no_handlers: AtomicBool::new(false),
            start: Utc::now(),
        }
    }

    #[inline]
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    fn no_handlers(&self, logger: &str, record: &Record) {
        if !self.warned_no_handlers.swap(true, Ordering::AcqRel) {
            eprintln!("No handlers could be found for logger \"{}\"", logger);
        }
        let last_resort = self.last_resort.read().clone();
        if let Some(handler) = last_resort {
            if record.level >= handler.level() {
                handler.handle(record);
            }
        }
    }
}

/// Per-logger memo of level decisions, valid for one hierarchy epoch.
#[derive(Default)]
struct LevelCache {
    epoch: u64,
    effective: Option<Level>,
    enabled: HashMap<u32, bool>,
}

impl LevelCache {
    fn reset_if_stale(&mut self, epoch: u64) {
        if self.epoch != epoch {
            self.epoch = epoch;
            self.effective = None;
            self.enabled.clear();
        }
    }
}

/// Everything about one logging call besides its level.
///
/// ```
/// use rust_logging::{Event, Level, Manager};
///
/// let manager = Manager::new();
/// let log = manager.get_logger("svc");
/// log.log_event(
///     Level::ERROR,
///     Event::new("request %s failed").args(["GET /"]).extra("tenant", "acme"),
/// )
/// .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Event {
    msg: String,
    args: Args,
    exc_info: Option<ExcInfo>,
    stack_info: bool,
    extra: BTreeMap<String, Value>,
    call_site: Option<CallSite>,
}

impl Event {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn args(mut self, args: impl Into<Args>) -> Self {
        self.args = args.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn exc_info(mut self, exc_info: ExcInfo) -> Self {
        self.exc_info = Some(exc_info);
        self
    }

    /// Capture `err` and its cause chain as exception info
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn error<E: Error + ?Sized>(self, err: &E) -> Self {
        self.exc_info(ExcInfo::from_error(err))
    }

    /// Attach a backtrace of the logging call
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn stack_info(mut self, capture: bool) -> Self {
        self.stack_info = capture;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Explicit location; skips the registry's call-site resolver
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }
}

/// A named node of the hierarchy.
///
/// Loggers are handed out as `Arc<Logger>` by [`Manager::get_logger`] and
/// live as long as their registry. Mutators take `&self`; handler lists are
/// swapped atomically so dispatch always walks a consistent snapshot.
pub struct Logger {
    name: String,
    level: AtomicU32,
    parent: RwLock<Weak<Logger>>,
    handlers: RwLock<Arc<Vec<Arc<Handler>>>>,
    propagate: AtomicBool,
    disabled: AtomicBool,
    filterer: Filterer,
    cache: RwLock<LevelCache>,
    hierarchy: Arc<Hierarchy>,
    registry: Weak<ManagerInner>,
}

impl Logger {
    fn new(
        name: impl Into<String>,
        level: Level,
        hierarchy: Arc<Hierarchy>,
        registry: Weak<ManagerInner>,
    ) -> Self {
        Self {
            name: name.into(),
            level: AtomicU32::new(level.value()),
            parent: RwLock::new(Weak::new()),
            handlers: RwLock::new(Arc::new(Vec::new())),
            propagate: AtomicBool::new(true),
            disabled: AtomicBool::new(false),
            filterer: Filterer::new(),
            cache: RwLock::new(LevelCache::default()),
            hierarchy,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicitly set level; NOTSET means inherit.
    #[inline]
    pub fn level(&self) -> Level {
        Level::new(self.level.load(Ordering::Acquire))
    }

    /// Set the level and invalidate every cached level decision in the
    /// registry before returning.
    pub fn set_level(&self, level: Level) {
        self.level.store(level.value(), Ordering::Release);
        self.hierarchy.invalidate();
    }

    pub fn parent(&self) -> Option<Arc<Logger>> {
        self.parent.read().upgrade()
    }

    /// Re-parent this logger.
    ///
    /// Fails if `parent` belongs to another registry or if the link would
    /// make this logger its own ancestor.
    pub fn set_parent(&self, parent: &Arc<Logger>) -> Result<()> {
        if !Arc::ptr_eq(&self.hierarchy, &parent.hierarchy) {
            return Err(LoggerError::config(
                format!("logger '{}'", self.name),
                format!("parent '{}' belongs to a different registry", parent.name),
            ));
        }
        let mut ancestor = Some(Arc::clone(parent));
        while let Some(node) = ancestor {
            if std::ptr::eq(Arc::as_ptr(&node), self) {
                return Err(LoggerError::config(
                    format!("logger '{}'", self.name),
                    format!("parent '{}' would create a cycle", parent.name),
                ));
            }
            ancestor = node.parent();
        }
        *self.parent.write() = Arc::downgrade(parent);
        self.hierarchy.invalidate();
        Ok(())
    }

    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::Acquire)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Release);
    }

    pub fn disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    /// First non-NOTSET level from this logger up to the root.
    pub fn effective_level(&self) -> Level {
        let epoch = self.hierarchy.epoch();
        {
            let cache = self.cache.read();
            if cache.epoch == epoch {
                if let Some(level) = cache.effective {
                    return level;
                }
            }
        }

        let mut level = self.level();
        let mut next = self.parent();
        while level.is_notset() {
            match next {
                Some(logger) => {
                    level = logger.level();
                    next = logger.parent();
                }
                None => break,
            }
        }

        let mut cache = self.cache.write();
        cache.reset_if_stale(epoch);
        cache.effective = Some(level);
        level
    }

    /// Whether a record at `level` would be processed by this logger.
    pub fn is_enabled_for(&self, level: Level) -> bool {
        if self.disabled() {
            return false;
        }
        let epoch = self.hierarchy.epoch();
        {
            let cache = self.cache.read();
            if cache.epoch == epoch {
                if let Some(&enabled) = cache.enabled.get(&level.value()) {
                    return enabled;
                }
            }
        }

        let enabled = if self.hierarchy.disable.load(Ordering::Acquire) >= level.value() {
            false
        } else {
            level >= self.effective_level()
        };

        let mut cache = self.cache.write();
        cache.reset_if_stale(epoch);
        cache.enabled.insert(level.value(), enabled);
        enabled
    }

    /// Snapshot of the handler list.
    pub fn handlers(&self) -> Arc<Vec<Arc<Handler>>> {
        Arc::clone(&self.handlers.read())
    }

    /// Attach a handler; attaching the same handler twice is a no-op.
    pub fn add_handler(&self, handler: Arc<Handler>) {
        let mut guard = self.handlers.write();
        if guard.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return;
        }
        let mut next = Vec::clone(&guard);
        next.push(handler);
        *guard = Arc::new(next);
    }

    pub fn remove_handler(&self, handler: &Arc<Handler>) {
        let mut guard = self.handlers.write();
        if !guard.iter().any(|h| Arc::ptr_eq(h, handler)) {
            return;
        }
        let next: Vec<_> = guard
            .iter()
            .filter(|h| !Arc::ptr_eq(h, handler))
            .cloned()
            .collect();
        *guard = Arc::new(next);
    }

    /// Detach all handlers, returning them.
    pub fn clear_handlers(&self) -> Vec<Arc<Handler>> {
        let previous = std::mem::replace(&mut *self.handlers.write(), Arc::new(Vec::new()));
        Vec::clone(&previous)
    }

    /// Whether this logger or any ancestor reachable by propagation has
    /// handlers.
    pub fn has_handlers(&self) -> bool {
        if !self.handlers.read().is_empty() {
            return true;
        }
        if !self.propagate() {
            return false;
        }
        let mut next = self.parent();
        while let Some(logger) = next {
            if !logger.handlers.read().is_empty() {
                return true;
            }
            next = if logger.propagate() { logger.parent() } else { None };
        }
        false
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

    /// Logger named `<self>.<suffix>` from the same registry.
    ///
    /// Returns `None` once the registry has been dropped.
    pub fn get_child(&self, suffix: &str) -> Option<Arc<Logger>> {
        let registry = self.registry.upgrade()?;
        let manager = Manager { inner: registry };
        if self.name == ROOT_NAME && self.parent().is_none() {
            Some(manager.get_logger(suffix))
        } else {
            Some(manager.get_logger(&format!("{}.{}", self.name, suffix)))
        }
    }

    /// Registry this logger belongs to, while it is alive.
    pub fn manager(&self) -> Option<Manager> {
        self.registry.upgrade().map(|inner| Manager { inner })
    }

    #[track_caller]
    pub fn log(&self, level: Level, msg: impl Into<String>, args: impl Into<Args>) {
        if self.is_enabled_for(level) {
            let event = Event::new(msg).args(args);
            if let Err(e) = self.dispatch(level, event, Location::caller()) {
                eprintln!("[LOGGER ERROR] Logger '{}' failed to build record: {}", self.name, e);
            }
        }
    }

    #[track_caller]
    pub fn debug(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::DEBUG, msg, args);
    }

    #[track_caller]
    pub fn info(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::INFO, msg, args);
    }

    #[track_caller]
    pub fn warning(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::WARNING, msg, args);
    }

    #[track_caller]
    pub fn error(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::ERROR, msg, args);
    }

    #[track_caller]
    pub fn critical(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::CRITICAL, msg, args);
    }

    /// Log at ERROR with `err` attached as exception info.
    #[track_caller]
    pub fn exception<E: Error + ?Sized>(
        &self,
        msg: impl Into<String>,
        args: impl Into<Args>,
        err: &E,
    ) {
        if self.is_enabled_for(Level::ERROR) {
            let event = Event::new(msg).args(args).error(err);
            if let Err(e) = self.dispatch(Level::ERROR, event, Location::caller()) {
                eprintln!("[LOGGER ERROR] Logger '{}' failed to build record: {}", self.name, e);
            }
        }
    }

    /// Log a fully described event.
    ///
    /// Unlike the shorthand methods this reports record construction
    /// problems, such as an `extra` key that shadows a built-in attribute.
    #[track_caller]
    pub fn log_event(&self, level: Level, event: Event) -> Result<()> {
        if !self.is_enabled_for(level) {
            return Ok(());
        }
        self.dispatch(level, event, Location::caller())
    }

    fn dispatch(
        &self,
        level: Level,
        event: Event,
        location: &'static Location<'static>,
    ) -> Result<()> {
        let call_site = match event.call_site {
            Some(call_site) => call_site,
            None => self.hierarchy.resolver.read().resolve(location),
        };
        let stack_info = event.stack_info.then(|| {
            format!(
                "Stack (most recent call last):\n{}",
                Backtrace::force_capture()
            )
        });
        let parts = RecordParts {
            name: self.name.clone(),
            level,
            call_site,
            msg: event.msg,
            args: event.args,
            exc_info: event.exc_info,
            stack_info,
            extra: event.extra,
            start: self.hierarchy.start,
        };
        let factory = Arc::clone(&self.hierarchy.record_factory.read());
        let record = factory.make(parts)?;
        self.handle(&record);
        Ok(())
    }

    /// Run logger filters, then hand the record to the handler chain.
    pub fn handle(&self, record: &Record) {
        if !self.disabled() && self.filterer.filter(record) {
            self.call_handlers(record);
        }
    }

    /// Deliver to this logger's handlers and then each ancestor's, stopping
    /// at the first logger with propagation off.
    pub fn call_handlers(&self, record: &Record) {
        let mut found = 0usize;
        let mut deliver = |logger: &Logger| {
            for handler in logger.handlers().iter() {
                found += 1;
                if record.level >= handler.level() {
                    handler.handle(record);
                }
            }
        };

        deliver(self);
        let mut next = if self.propagate() { self.parent() } else { None };
        while let Some(logger) = next {
            deliver(&logger);
            next = if logger.propagate() { logger.parent() } else { None };
        }

        if found == 0 {
            self.hierarchy.no_handlers(&self.name, record);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("propagate", &self.propagate())
            .field("handlers", &self.handlers.read().len())
            .finish_non_exhaustive()
    }
}

enum Node {
    Logger(Arc<Logger>),
    /// Loggers created below a name that has no logger yet
    Placeholder(Vec<Arc<Logger>>),
}

struct ManagerInner {
    hierarchy: Arc<Hierarchy>,
    nodes: Mutex<HashMap<String, Node>>,
    root: Arc<Logger>,
}

/// Registry of loggers.
///
/// Cloning is cheap and yields a handle to the same registry. Tests create a
/// fresh `Manager` per case; [`crate::global`] keeps one for the process.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<ManagerInner>,
}

impl Manager {
    pub fn new() -> Self {
        let hierarchy = Arc::new(Hierarchy::new());
        let inner = Arc::new_cyclic(|weak: &Weak<ManagerInner>| ManagerInner {
            root: Arc::new(Logger::new(
                ROOT_NAME,
                Level::WARNING,
                Arc::clone(&hierarchy),
                weak.clone(),
            )),
            nodes: Mutex::new(HashMap::new()),
            hierarchy,
        });
        Self { inner }
    }

    pub fn root(&self) -> Arc<Logger> {
        Arc::clone(&self.inner.root)
    }

    /// Logger for `name`, created on first request.
    ///
    /// An empty name or `"root"` returns the root logger.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if name.is_empty() || name == ROOT_NAME {
            return self.root();
        }

        let mut nodes = self.inner.nodes.lock();
        let pending = match nodes.get(name) {
            Some(Node::Logger(logger)) => return Arc::clone(logger),
            Some(Node::Placeholder(_)) => true,
            None => false,
        };

        let logger = Arc::new(Logger::new(
            name,
            Level::NOTSET,
            Arc::clone(&self.inner.hierarchy),
            Arc::downgrade(&self.inner),
        ));
        let previous = nodes.insert(name.to_string(), Node::Logger(Arc::clone(&logger)));
        if pending {
            if let Some(Node::Placeholder(children)) = previous {
                self.fixup_children(&logger, &children);
            }
        }
        self.fixup_parents(&mut nodes, &logger);
        drop(nodes);

        self.inner.hierarchy.invalidate();
        logger
    }

    /// Link `logger` to its nearest existing ancestor, leaving placeholders
    /// for the missing ones.
    fn fixup_parents(&self, nodes: &mut HashMap<String, Node>, logger: &Arc<Logger>) {
        let name = logger.name();
        let mut parent = None;
        let mut end = name.rfind('.');
        while let Some(idx) = end.filter(|&i| i > 0) {
            let prefix = &name[..idx];
            match nodes.get_mut(prefix) {
                None => {
                    nodes.insert(
                        prefix.to_string(),
                        Node::Placeholder(vec![Arc::clone(logger)]),
                    );
                }
                Some(Node::Placeholder(children)) => {
                    if !children.iter().any(|c| Arc::ptr_eq(c, logger)) {
                        children.push(Arc::clone(logger));
                    }
                }
                Some(Node::Logger(existing)) => {
                    parent = Some(Arc::clone(existing));
                    break;
                }
            }
            end = prefix.rfind('.');
        }
        let parent = parent.unwrap_or_else(|| self.root());
        *logger.parent.write() = Arc::downgrade(&parent);
    }

    /// Insert `logger` between each pending child and that child's current
    /// parent, unless the child already hangs below `logger`.
    fn fixup_children(&self, logger: &Arc<Logger>, children: &[Arc<Logger>]) {
        let name = logger.name();
        let nested = format!("{}.", name);
        for child in children {
            let Some(current) = child.parent() else {
                continue;
            };
            let below = !Arc::ptr_eq(&current, &self.inner.root)
                && (current.name == name || current.name.starts_with(&nested));
            if !below {
                *logger.parent.write() = Arc::downgrade(&current);
                *child.parent.write() = Arc::downgrade(logger);
            }
        }
    }

    /// Names of every created logger (not placeholders), sorted.
    pub fn logger_names(&self) -> Vec<String> {
        let nodes = self.inner.nodes.lock();
        let mut names: Vec<String> = nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::Logger(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Every created logger except the root, sorted by name.
    pub fn loggers(&self) -> Vec<Arc<Logger>> {
        let nodes = self.inner.nodes.lock();
        let mut loggers: Vec<Arc<Logger>> = nodes
            .values()
            .filter_map(|node| match node {
                Node::Logger(logger) => Some(Arc::clone(logger)),
                Node::Placeholder(_) => None,
            })
            .collect();
        loggers.sort_by(|a, b| a.name.cmp(&b.name));
        loggers
    }

    /// Suppress every record at or below `level` across the registry.
    /// `Level::NOTSET` lifts the suppression.
    pub fn disable(&self, level: Level) {
        self.inner
            .hierarchy
            .disable
            .store(level.value(), Ordering::Release);
        self.inner.hierarchy.invalidate();
    }

    pub fn disable_level(&self) -> Level {
        Level::new(self.inner.hierarchy.disable.load(Ordering::Acquire))
    }

    /// Install a record factory for every logger of this registry.
    pub fn set_record_factory(&self, factory: Arc<dyn RecordFactory>) {
        *self.inner.hierarchy.record_factory.write() = factory;
    }

    pub fn set_call_site_resolver(&self, resolver: Arc<dyn CallSiteResolver>) {
        *self.inner.hierarchy.resolver.write() = resolver;
    }

    /// Handler used when a record finds no handler at all; `None` turns the
    /// fallback off.
    pub fn set_last_resort(&self, handler: Option<Arc<Handler>>) {
        *self.inner.hierarchy.last_resort.write() = handler;
    }

    pub fn last_resort(&self) -> Option<Arc<Handler>> {
        self.inner.hierarchy.last_resort.read().clone()
    }

    /// Whether the one-time "no handlers" warning has been printed.
    pub fn no_handler_warning_emitted(&self) -> bool {
        self.inner.hierarchy.warned_no_handlers.load(Ordering::Acquire)
    }

    /// When this registry was created; origin of `relativeCreated`.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.inner.hierarchy.start
    }

    /// Flush and close every handler attached to any logger.
    ///
    /// All handlers are visited even if some fail; the first error is
    /// returned.
    pub fn shutdown(&self) -> Result<()> {
        let mut seen: Vec<Arc<Handler>> = Vec::new();
        let loggers = std::iter::once(self.root()).chain(self.loggers());
        for logger in loggers {
            for handler in logger.handlers().iter() {
                if !seen.iter().any(|h| Arc::ptr_eq(h, handler)) {
                    seen.push(Arc::clone(handler));
                }
            }
        }

        let mut first_error = None;
        for handler in seen.iter().rev() {
            let result = handler.flush().and_then(|()| handler.close());
            if let Err(e) = result {
                eprintln!("[LOGGER ERROR] Failed to close handler '{}': {}", handler.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("loggers", &self.logger_names())
            .field("disable", &self.disable_level())
            .finish()
    }
}
