//! Source location of a logging call
//!
//! The hierarchy never inspects the stack itself. Logging methods are
//! `#[track_caller]` and hand the caller's [`Location`] to whichever
//! [`CallSiteResolver`] is installed on the registry.

use std::panic::Location;
use std::path::Path;

/// Function name recorded when the resolver cannot tell.
pub const UNKNOWN_FUNCTION: &str = "(unknown function)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub pathname: String,
    pub lineno: u32,
    pub func_name: String,
    /// Rust module path when known (the macros supply `module_path!()`)
    pub module: Option<String>,
}

impl CallSite {
    #[must_use]
    pub fn new(pathname: impl Into<String>, lineno: u32) -> Self {
        Self {
            pathname: pathname.into(),
            lineno,
            func_name: UNKNOWN_FUNCTION.to_string(),
            module: None,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_function(mut self, func_name: impl Into<String>) -> Self {
        self.func_name = func_name.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Placeholder used when location capture is switched off.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("(unknown file)", 0)
    }

    pub fn filename(&self) -> &str {
        Path::new(&self.pathname)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.pathname)
    }

    /// Module path if supplied, else the file stem.
    pub fn module_name(&self) -> &str {
        match &self.module {
            Some(module) => module,
            None => Path::new(&self.pathname)
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown"),
        }
    }
}

/// Turns a caller location into a [`CallSite`].
pub trait CallSiteResolver: Send + Sync {
    fn resolve(&self, location: &'static Location<'static>) -> CallSite;
}

/// Uses the file and line captured by `#[track_caller]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallerLocation;

impl CallSiteResolver for CallerLocation {
    fn resolve(&self, location: &'static Location<'static>) -> CallSite {
        CallSite::new(location.file(), location.line())
    }
}

/// Skips location capture entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCallSite;

impl CallSiteResolver for NoCallSite {
    fn resolve(&self, _location: &'static Location<'static>) -> CallSite {
        CallSite::unknown()
    }
}
