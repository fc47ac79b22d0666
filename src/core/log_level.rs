//! Numeric severity levels
//!
//! Levels are plain integers so applications can define their own severities
//! between the standard ones. Only the standard values carry a name; any other
//! integer renders as an empty name.

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "LevelSpec", into = "u32")]
pub struct Level(u32);

impl Level {
    pub const NOTSET: Level = Level(0);
    pub const DEBUG: Level = Level(10);
    pub const INFO: Level = Level(20);
    pub const WARNING: Level = Level(30);
    pub const ERROR: Level = Level(40);
    pub const CRITICAL: Level = Level(50);

    /// Alias of [`Level::WARNING`]
    pub const WARN: Level = Level::WARNING;
    /// Alias of [`Level::CRITICAL`]
    pub const FATAL: Level = Level::CRITICAL;

    #[must_use]
    pub const fn new(value: u32) -> Self {
        Level(value)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_notset(self) -> bool {
        self.0 == 0
    }

    /// Standard name of this level, or `""` for a custom value
    pub fn name(self) -> &'static str {
        level_name(self)
    }
}

/// Name lookup for the standard severities.
pub fn level_name(level: Level) -> &'static str {
    match level.0 {
        0 => "NOTSET",
        10 => "DEBUG",
        20 => "INFO",
        30 => "WARNING",
        40 => "ERROR",
        50 => "CRITICAL",
        _ => "",
    }
}

impl From<u32> for Level {
    fn from(value: u32) -> Self {
        Level(value)
    }
}

impl From<Level> for u32 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_uppercase().as_str() {
            "NOTSET" => Ok(Level::NOTSET),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARN" | "WARNING" => Ok(Level::WARNING),
            "ERROR" => Ok(Level::ERROR),
            "FATAL" | "CRITICAL" => Ok(Level::CRITICAL),
            other => other
                .parse::<u32>()
                .map(Level)
                .map_err(|_| LoggerError::InvalidLevel(s.to_string())),
        }
    }
}

/// Level as written in configuration: a name or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Number(u32),
    Name(String),
}

impl TryFrom<LevelSpec> for Level {
    type Error = LoggerError;

    fn try_from(spec: LevelSpec) -> Result<Self, Self::Error> {
        match spec {
            LevelSpec::Number(value) => Ok(Level(value)),
            LevelSpec::Name(name) => name.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_names() {
        assert_eq!(Level::DEBUG.name(), "DEBUG");
        assert_eq!(Level::WARN.name(), "WARNING");
        assert_eq!(Level::FATAL.to_string(), "CRITICAL");
        assert_eq!(Level::NOTSET.name(), "NOTSET");
    }

    #[test]
    fn test_custom_level_renders_blank() {
        assert_eq!(Level::new(25).name(), "");
        assert_eq!(Level::new(5).to_string(), "");
        assert!(Level::new(25) > Level::INFO);
        assert!(Level::new(25) < Level::WARNING);
    }

    #[test]
    fn test_parse_names_and_numbers() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::INFO);
        assert_eq!("Warn".parse::<Level>().unwrap(), Level::WARNING);
        assert_eq!("FATAL".parse::<Level>().unwrap(), Level::CRITICAL);
        assert_eq!("15".parse::<Level>().unwrap(), Level::new(15));
    }

    #[test]
    fn test_parse_rejects_unknown_name() {
        let err = "LOUD".parse::<Level>().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel(name) if name == "LOUD"));
    }

    #[test]
    fn test_deserialize_from_name_or_number() {
        let level: Level = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, Level::ERROR);

        let level: Level = serde_json::from_str("35").unwrap();
        assert_eq!(level, Level::new(35));

        assert!(serde_json::from_str::<Level>("\"verbose\"").is_err());
    }
}
