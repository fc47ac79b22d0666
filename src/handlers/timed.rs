//! Time-based rollover
//!
//! [`TimedRotation`] renames the live file to `<name>.<timestamp>` at fixed
//! instants and keeps the newest `backup_count` archives. The next instant is
//! computed up front, so the per-record check is a single comparison.
//!
//! # Example
//!
//! ```no_run
//! use rust_logging::{FileSink, Handler, TimedRotation, When};
//!
//! let policy = TimedRotation::new(When::Midnight, 1, 7).unwrap();
//! let sink = FileSink::builder("/var/log/app.log").policy(policy).build().unwrap();
//! let handler = Handler::new(sink);
//! ```

use super::file::{LogFile, RolloverPolicy};
use crate::core::{LoggerError, Result};
use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Timelike, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

const DAY: i64 = 24 * 60 * 60;

/// Source of "now" for rollover decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Rollover unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Seconds,
    Minutes,
    Hours,
    Days,
    /// At midnight, or at `at_time` when set
    Midnight,
    /// On the given weekday, 0 = Monday. Without `at_time` the rollover
    /// happens at the midnight that ends that day.
    Weekday(u8),
}

impl When {
    fn unit_seconds(self) -> i64 {
        match self {
            When::Seconds => 1,
            When::Minutes => 60,
            When::Hours => 60 * 60,
            When::Days | When::Midnight => DAY,
            When::Weekday(_) => 7 * DAY,
        }
    }

    /// strftime suffix for archived files
    fn suffix(self) -> &'static str {
        match self {
            When::Seconds => "%Y-%m-%d_%H-%M-%S",
            When::Minutes => "%Y-%m-%d_%H-%M",
            When::Hours => "%Y-%m-%d_%H",
            When::Days | When::Midnight | When::Weekday(_) => "%Y-%m-%d",
        }
    }
}

impl FromStr for When {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "S" => Ok(When::Seconds),
            "M" => Ok(When::Minutes),
            "H" => Ok(When::Hours),
            "D" => Ok(When::Days),
            "MIDNIGHT" => Ok(When::Midnight),
            w if w.len() == 2 && w.starts_with('W') => match w.as_bytes()[1] {
                day @ b'0'..=b'6' => Ok(When::Weekday(day - b'0')),
                _ => Err(LoggerError::config(
                    "timed rotation",
                    format!("Invalid day specified for weekly rollover: {}", s),
                )),
            },
            _ => Err(LoggerError::config(
                "timed rotation",
                format!("Invalid rollover interval specified: {}", s),
            )),
        }
    }
}

/// One element of an archive suffix: a run of digits or a literal character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Digits(usize),
    Literal(char),
}

fn suffix_shape(suffix: &str) -> Vec<Shape> {
    let mut shape = Vec::new();
    let mut chars = suffix.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                Some('Y') => shape.push(Shape::Digits(4)),
                Some(_) => shape.push(Shape::Digits(2)),
                None => shape.push(Shape::Literal('%')),
            }
        } else {
            shape.push(Shape::Literal(c));
        }
    }
    shape
}

/// Matches a timestamp of `shape`, optionally followed by `.ext` as added by
/// a namer such as the gzip one.
fn matches_shape(shape: &[Shape], candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    let mut pos = 0;
    for part in shape {
        match *part {
            Shape::Digits(n) => {
                if pos + n > bytes.len() || !bytes[pos..pos + n].iter().all(u8::is_ascii_digit) {
                    return false;
                }
                pos += n;
            }
            Shape::Literal(c) => {
                let mut buf = [0u8; 4];
                let lit = c.encode_utf8(&mut buf).as_bytes();
                if !bytes[pos..].starts_with(lit) {
                    return false;
                }
                pos += lit.len();
            }
        }
    }
    let rest = &candidate[pos..];
    rest.is_empty()
        || rest
            .strip_prefix('.')
            .is_some_and(|ext| !ext.is_empty() && ext.chars().all(|c| c == '_' || c.is_alphanumeric()))
}

/// Rotate at fixed instants.
pub struct TimedRotation {
    when: When,
    /// Seconds between rollovers
    interval: i64,
    backup_count: usize,
    utc: bool,
    at_time: Option<NaiveTime>,
    clock: Arc<dyn Clock>,
    shape: Vec<Shape>,
    rollover_at: i64,
}

impl TimedRotation {
    /// Rotate every `interval` units of `when`, keeping `backup_count`
    /// archives (0 keeps all).
    pub fn new(when: When, interval: u32, backup_count: usize) -> Result<Self> {
        if interval == 0 {
            return Err(LoggerError::config(
                "timed rotation",
                "interval must be at least 1",
            ));
        }
        Ok(Self {
            when,
            interval: when.unit_seconds() * i64::from(interval),
            backup_count,
            utc: false,
            at_time: None,
            clock: Arc::new(SystemClock),
            shape: suffix_shape(when.suffix()),
            rollover_at: 0,
        })
    }

    /// Compute instants and archive names in UTC rather than local time
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    /// Time of day for midnight and weekly rollovers
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn at_time(mut self, at: NaiveTime) -> Self {
        self.at_time = Some(at);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn when(&self) -> When {
        self.when
    }

    pub fn interval_seconds(&self) -> i64 {
        self.interval
    }

    /// Next rollover as a unix timestamp.
    pub fn rollover_at(&self) -> i64 {
        self.rollover_at
    }

    fn local_offset(timestamp: i64) -> i64 {
        Local
            .timestamp_opt(timestamp, 0)
            .single()
            .map_or(0, |t| i64::from(t.offset().local_minus_utc()))
    }

    /// (seconds since midnight, weekday with Monday = 0) in the configured zone
    fn civil(&self, timestamp: i64) -> (i64, u32) {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
        if self.utc {
            (
                i64::from(utc.num_seconds_from_midnight()),
                utc.weekday().num_days_from_monday(),
            )
        } else {
            let local = utc.with_timezone(&Local);
            (
                i64::from(local.num_seconds_from_midnight()),
                local.weekday().num_days_from_monday(),
            )
        }
    }

    /// First rollover instant after `current`.
    pub fn compute_rollover(&self, current: i64) -> i64 {
        let mut result = current + self.interval;
        if !matches!(self.when, When::Midnight | When::Weekday(_)) {
            return result;
        }

        let (seconds_today, mut day) = self.civil(current);
        let rotate_at = self
            .at_time
            .map_or(DAY, |t| i64::from(t.num_seconds_from_midnight()));
        let mut remaining = rotate_at - seconds_today;
        if remaining <= 0 {
            // today's rotation time has passed
            remaining += DAY;
            day = (day + 1) % 7;
        }
        result = current + remaining;

        match self.when {
            When::Weekday(target) => {
                let target = u32::from(target);
                if day != target {
                    let wait = if day < target {
                        target - day
                    } else {
                        6 - day + target + 1
                    };
                    result += i64::from(wait) * DAY;
                }
                result += self.interval - 7 * DAY;
            }
            _ => result += self.interval - DAY,
        }

        if !self.utc {
            let offset_now = Self::local_offset(current);
            let offset_then = Self::local_offset(result);
            if offset_now != offset_then {
                result += offset_now - offset_then;
            }
        }
        result
    }

    fn archive_suffix(&self, timestamp: i64) -> String {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
        if self.utc {
            utc.format(self.when.suffix()).to_string()
        } else {
            utc.with_timezone(&Local).format(self.when.suffix()).to_string()
        }
    }

    /// Archives beyond the retention count, oldest first.
    pub fn files_to_delete(&self, file: &LogFile) -> Result<Vec<PathBuf>> {
        let path = file.path();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let prefix = format!("{}.", base);

        let mut matches: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(suffix) = name.strip_prefix(&prefix) {
                if matches_shape(&self.shape, suffix) {
                    matches.push(dir.join(name));
                }
            }
        }

        if matches.len() <= self.backup_count {
            return Ok(Vec::new());
        }
        matches.sort();
        matches.truncate(matches.len() - self.backup_count);
        Ok(matches)
    }
}

impl RolloverPolicy for TimedRotation {
    fn attach(&mut self, file: &LogFile) -> Result<()> {
        let start = fs::metadata(file.path())
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map_or_else(|| self.clock.now().timestamp(), |d| d.as_secs() as i64);
        self.rollover_at = self.compute_rollover(start);
        Ok(())
    }

    fn should_rollover(&mut self, file: &mut LogFile, _text: &str, _terminator: &str) -> Result<bool> {
        let now = self.clock.now().timestamp();
        if now < self.rollover_at {
            return Ok(false);
        }
        let special = fs::symlink_metadata(file.path())
            .map(|m| !m.file_type().is_file())
            .unwrap_or(false);
        if special {
            // never rotate devices or links, but stop re-checking on every record
            self.rollover_at = self.compute_rollover(now);
            return Ok(false);
        }
        Ok(true)
    }

    fn do_rollover(&mut self, file: &mut LogFile) -> Result<()> {
        file.close()?;
        let now = self.clock.now().timestamp();

        let mut period_start = self.rollover_at - self.interval;
        if !self.utc {
            let offset_now = Self::local_offset(now);
            let offset_then = Self::local_offset(period_start);
            if offset_now != offset_then {
                period_start += offset_now - offset_then;
            }
        }

        let dest = file.rotation_filename(&file.sibling(self.archive_suffix(period_start)));
        if dest.exists() {
            fs::remove_file(&dest)?;
        }
        let base = file.path().to_path_buf();
        file.rotate(&base, &dest)?;

        if self.backup_count > 0 {
            for old in self.files_to_delete(file)? {
                fs::remove_file(&old)?;
            }
        }
        if !file.delay() {
            file.open()?;
        }
        self.rollover_at = self.compute_rollover(now);
        Ok(())
    }
}

impl fmt::Debug for TimedRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedRotation")
            .field("when", &self.when)
            .field("interval", &self.interval)
            .field("backup_count", &self.backup_count)
            .field("utc", &self.utc)
            .field("at_time", &self.at_time)
            .field("rollover_at", &self.rollover_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Handler, Level, Record};
    use crate::handlers::FileSink;
    use chrono::Duration;
    use tempfile::tempdir;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_when() {
        assert_eq!("s".parse::<When>().unwrap(), When::Seconds);
        assert_eq!("midnight".parse::<When>().unwrap(), When::Midnight);
        assert_eq!("W6".parse::<When>().unwrap(), When::Weekday(6));
        assert!("W7".parse::<When>().is_err());
        assert!("X".parse::<When>().is_err());
        assert!(TimedRotation::new(When::Hours, 0, 1).is_err());
    }

    #[test]
    fn test_interval_multiplier() {
        let policy = TimedRotation::new(When::Minutes, 5, 0).unwrap().utc(true);
        let start = at("2024-03-01T10:00:00Z").timestamp();
        assert_eq!(policy.compute_rollover(start), start + 300);
    }

    #[test]
    fn test_midnight_rollover() {
        let policy = TimedRotation::new(When::Midnight, 1, 0).unwrap().utc(true);
        let start = at("2024-03-01T22:30:00Z").timestamp();
        assert_eq!(policy.compute_rollover(start), at("2024-03-02T00:00:00Z").timestamp());

        let policy = policy.at_time(NaiveTime::from_hms_opt(3, 0, 0).unwrap());
        assert_eq!(policy.compute_rollover(start), at("2024-03-02T03:00:00Z").timestamp());
        let early = at("2024-03-01T01:00:00Z").timestamp();
        assert_eq!(policy.compute_rollover(early), at("2024-03-01T03:00:00Z").timestamp());
    }

    #[test]
    fn test_weekly_rollover() {
        // 2024-03-01 is a Friday (weekday 4); rollover is the midnight ending the target day
        let start = at("2024-03-01T12:00:00Z").timestamp();
        let monday = TimedRotation::new(When::Weekday(0), 1, 0).unwrap().utc(true);
        assert_eq!(monday.compute_rollover(start), at("2024-03-05T00:00:00Z").timestamp());

        let saturday = TimedRotation::new(When::Weekday(5), 1, 0).unwrap().utc(true);
        assert_eq!(saturday.compute_rollover(start), at("2024-03-03T00:00:00Z").timestamp());

        let friday = TimedRotation::new(When::Weekday(4), 1, 0).unwrap().utc(true);
        assert_eq!(friday.compute_rollover(start), at("2024-03-02T00:00:00Z").timestamp());

        let friday_noon = friday.at_time(NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(friday_noon.compute_rollover(start), at("2024-03-01T13:00:00Z").timestamp());
    }

    #[test]
    fn test_suffix_matching() {
        let shape = suffix_shape(When::Seconds.suffix());
        assert!(matches_shape(&shape, "2024-03-01_10-00-00"));
        assert!(matches_shape(&shape, "2024-03-01_10-00-00.gz"));
        assert!(!matches_shape(&shape, "2024-03-01_10-00"));
        assert!(!matches_shape(&shape, "2024-03-01_10-00-00."));
        assert!(!matches_shape(&shape, "backup"));
    }

    #[test]
    fn test_timed_rotation_with_manual_clock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timed.log");
        let clock = Arc::new(ManualClock::new(at("2024-03-01T10:00:00Z")));
        let policy = TimedRotation::new(When::Seconds, 10, 2)
            .unwrap()
            .utc(true)
            .clock(clock.clone());
        let sink = FileSink::builder(&path).delay(true).policy(policy).build().unwrap();
        let handler = Handler::new(sink);
        let log = |msg: &str| handler.handle(&Record::new("t", Level::INFO, msg));

        log("first");
        clock.advance(Duration::seconds(10));
        log("second");
        clock.advance(Duration::seconds(10));
        log("third");
        clock.advance(Duration::seconds(10));
        log("fourth");
        handler.close().unwrap();

        let archive = |s: &str| dir.path().join(format!("timed.log.{}", s));
        assert!(!archive("2024-03-01_10-00-00").exists());
        assert_eq!(fs::read_to_string(archive("2024-03-01_10-00-10")).unwrap(), "second\n");
        assert_eq!(fs::read_to_string(archive("2024-03-01_10-00-20")).unwrap(), "third\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "fourth\n");
    }
}
