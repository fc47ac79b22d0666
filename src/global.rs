//! Process-wide convenience layer
//!
//! A default [`Manager`] is created on first use. The module-level logging
//! functions send to its root logger and install a standard error handler
//! there first if the root has none, so a bare `global::warning(..)` is
//! never silently lost.
//!
//! # Example
//!
//! ```
//! use rust_logging::{global, Value};
//!
//! global::warning("disk %d%% full", vec![Value::from(91)]);
//! global::get_logger("app.net").error("connection reset", ());
//! ```

use crate::config::{self, BasicConfig};
use crate::core::{Args, Level, Logger, Manager, Result};
use std::error::Error;
use std::sync::{Arc, OnceLock};

static DEFAULT_MANAGER: OnceLock<Manager> = OnceLock::new();

/// The process-wide registry.
pub fn manager() -> &'static Manager {
    DEFAULT_MANAGER.get_or_init(Manager::new)
}

pub fn get_logger(name: &str) -> Arc<Logger> {
    manager().get_logger(name)
}

pub fn root() -> Arc<Logger> {
    manager().root()
}

/// [`config::basic_config`] on the process-wide registry.
pub fn basic_config(config: BasicConfig) -> Result<()> {
    config::basic_config(manager(), config)
}

pub fn disable(level: Level) {
    manager().disable(level);
}

/// Flush and close every handler reachable from the process-wide registry.
pub fn shutdown() -> Result<()> {
    manager().shutdown()
}

fn configured_root() -> Arc<Logger> {
    let root = root();
    if root.handlers().is_empty() {
        if let Err(e) = basic_config(BasicConfig::new()) {
            eprintln!("[LOGGER ERROR] Failed to configure root logger: {}", e);
        }
    }
    root
}

#[track_caller]
pub fn log(level: Level, msg: impl Into<String>, args: impl Into<Args>) {
    configured_root().log(level, msg, args);
}

#[track_caller]
pub fn debug(msg: impl Into<String>, args: impl Into<Args>) {
    configured_root().debug(msg, args);
}

#[track_caller]
pub fn info(msg: impl Into<String>, args: impl Into<Args>) {
    configured_root().info(msg, args);
}

#[track_caller]
pub fn warning(msg: impl Into<String>, args: impl Into<Args>) {
    configured_root().warning(msg, args);
}

#[track_caller]
pub fn error(msg: impl Into<String>, args: impl Into<Args>) {
    configured_root().error(msg, args);
}

#[track_caller]
pub fn critical(msg: impl Into<String>, args: impl Into<Args>) {
    configured_root().critical(msg, args);
}

#[track_caller]
pub fn exception<E: Error + ?Sized>(msg: impl Into<String>, args: impl Into<Args>, err: &E) {
    configured_root().exception(msg, args, err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_default_manager_is_shared() {
        let a = get_logger("global.shared");
        let b = manager().get_logger("global.shared");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&root(), &manager().root()));
    }

    #[test]
    fn test_first_call_installs_root_handler() {
        critical("global layer %s", vec![Value::from("ready")]);
        assert!(!root().handlers().is_empty());
    }
}
