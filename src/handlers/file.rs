//! File output with pluggable rollover
//!
//! A [`FileSink`] writes to one [`LogFile`] and consults a [`RolloverPolicy`]
//! before every record. The policies shipped here cover the common cases:
//!
//! - [`NoRollover`]: plain append-only file
//! - [`SizeRotation`]: numbered backups (`app.log.1`, `app.log.2`, ...)
//! - [`WatchedFile`]: reopen when something else moved or replaced the file
//! - [`TimedRotation`](super::TimedRotation): timestamped backups
//!
//! # Examples
//!
//! ```no_run
//! use rust_logging::{FileSink, Handler};
//!
//! // keep app.log under 10 MiB with five numbered backups
//! let sink = FileSink::rotating("/var/log/app.log", 10 * 1024 * 1024, 5).unwrap();
//! let handler = Handler::new(sink);
//! ```

use super::compress::{gzip_namer, gzip_rotator};
use crate::core::{Delivery, Formatter, LoggerError, Record, Result, Sink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// How an existing file is treated on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileMode {
    #[default]
    #[serde(rename = "a")]
    Append,
    #[serde(rename = "w")]
    Truncate,
}

impl FromStr for FileMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "a" => Ok(FileMode::Append),
            "w" => Ok(FileMode::Truncate),
            other => Err(LoggerError::config(
                "file handler",
                format!("unsupported mode '{}'", other),
            )),
        }
    }
}

/// Maps the default name of a rotated file to the name actually used.
pub type Namer = Arc<dyn Fn(&Path) -> PathBuf + Send + Sync>;

/// Moves (and possibly transforms) the live file to its rotated name.
pub type Rotator = Arc<dyn Fn(&Path, &Path) -> Result<()> + Send + Sync>;

/// The live file behind a [`FileSink`].
///
/// Tracks the byte position of the open file so size checks never stat the
/// file on the write path.
pub struct LogFile {
    path: PathBuf,
    mode: FileMode,
    delay: bool,
    writer: Option<BufWriter<File>>,
    position: u64,
    namer: Option<Namer>,
    rotator: Option<Rotator>,
}

impl LogFile {
    /// Open `path` now, or on first write when `delay` is set.
    pub fn new(path: impl Into<PathBuf>, mode: FileMode, delay: bool) -> Result<Self> {
        let mut file = Self {
            path: path.into(),
            mode,
            delay,
            writer: None,
            position: 0,
            namer: None,
            rotator: None,
        };
        if !delay {
            file.open()?;
        }
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn delay(&self) -> bool {
        self.delay
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Bytes in the open file, or in the file on disk when not open.
    pub fn position(&self) -> u64 {
        if self.is_open() {
            return self.position;
        }
        match self.mode {
            FileMode::Append => fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0),
            FileMode::Truncate => 0,
        }
    }

    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match self.mode {
            FileMode::Append => options.append(true),
            FileMode::Truncate => options.write(true).truncate(true),
        };
        let file = options.open(&self.path).map_err(|e| {
            LoggerError::io_operation(
                "open log file",
                format!("Failed to open '{}'", self.path.display()),
                e,
            )
        })?;
        self.position = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    /// Write `text` and `terminator`, opening the file first if needed.
    pub fn write_line(&mut self, text: &str, terminator: &str) -> Result<()> {
        self.open()?;
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return Err(LoggerError::io_operation(
                "write log file",
                format!("'{}' is not open", self.path.display()),
                std::io::Error::from(std::io::ErrorKind::NotConnected),
            )),
        };
        writer.write_all(text.as_bytes())?;
        writer.write_all(terminator.as_bytes())?;
        writer.flush()?;
        self.position += (text.len() + terminator.len()) as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and release the OS handle. Reopened by the next write.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation(
                    "close log file",
                    format!("Failed to flush '{}'", self.path.display()),
                    e,
                )
            })?;
        }
        self.position = 0;
        Ok(())
    }

    pub fn set_namer(&mut self, namer: Option<Namer>) {
        self.namer = namer;
    }

    pub fn set_rotator(&mut self, rotator: Option<Rotator>) {
        self.rotator = rotator;
    }

    /// Name a rotated file will actually get.
    pub fn rotation_filename(&self, default: &Path) -> PathBuf {
        match &self.namer {
            Some(namer) => namer(default),
            None => default.to_path_buf(),
        }
    }

    /// Move `source` to `dest` with the rotator, or by renaming when none is
    /// set. A missing source is not an error.
    pub fn rotate(&self, source: &Path, dest: &Path) -> Result<()> {
        if let Some(rotator) = &self.rotator {
            return rotator(source, dest);
        }
        if source.exists() {
            rename_replacing(source, dest)?;
        }
        Ok(())
    }

    /// `<path>.<suffix>`
    pub fn sibling(&self, suffix: impl fmt::Display) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", suffix));
        PathBuf::from(name)
    }
}

impl fmt::Debug for LogFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("delay", &self.delay)
            .field("open", &self.is_open())
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

pub(crate) fn rename_replacing(source: &Path, dest: &Path) -> Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            // some platforms refuse to rename over an existing file
            if dest.exists() {
                let _ = fs::remove_file(dest);
            }
            fs::rename(source, dest).map_err(|e| {
                LoggerError::file_rotation(
                    source.display().to_string(),
                    format!("Failed to rename to '{}': {}", dest.display(), e),
                )
            })
        }
    }
}

/// Decides when the live file is replaced and performs the replacement.
pub trait RolloverPolicy: Send {
    /// Called once when the sink is built.
    fn attach(&mut self, _file: &LogFile) -> Result<()> {
        Ok(())
    }

    /// Called before each write with the formatted text about to be written.
    fn should_rollover(&mut self, file: &mut LogFile, text: &str, terminator: &str)
        -> Result<bool>;

    fn do_rollover(&mut self, file: &mut LogFile) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoRollover;

impl RolloverPolicy for NoRollover {
    fn should_rollover(&mut self, _file: &mut LogFile, _text: &str, _terminator: &str) -> Result<bool> {
        Ok(false)
    }

    fn do_rollover(&mut self, _file: &mut LogFile) -> Result<()> {
        Ok(())
    }
}

/// True when `path` exists and is something other than a regular file.
/// Symlinks count as not regular.
fn is_special_file(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(meta) => !meta.file_type().is_file(),
        Err(_) => false,
    }
}

/// Rotate when the next record would push the file past `max_bytes`.
///
/// Backups are numbered: the live file becomes `.1`, `.1` becomes `.2`, and
/// so on up to `backup_count`; older ones are overwritten. With
/// `backup_count == 0` the file is only reopened and keeps growing. A
/// `max_bytes` of zero turns rotation off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRotation {
    max_bytes: u64,
    backup_count: usize,
}

impl SizeRotation {
    #[must_use]
    pub fn new(max_bytes: u64, backup_count: usize) -> Self {
        Self {
            max_bytes,
            backup_count,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }
}

impl RolloverPolicy for SizeRotation {
    fn should_rollover(&mut self, file: &mut LogFile, text: &str, terminator: &str) -> Result<bool> {
        if self.max_bytes == 0 || is_special_file(file.path()) {
            return Ok(false);
        }
        file.open()?;
        let projected = file.position() + (text.len() + terminator.len()) as u64;
        Ok(projected >= self.max_bytes)
    }

    fn do_rollover(&mut self, file: &mut LogFile) -> Result<()> {
        file.close()?;
        if self.backup_count > 0 {
            for i in (1..self.backup_count).rev() {
                let source = file.rotation_filename(&file.sibling(i));
                let dest = file.rotation_filename(&file.sibling(i + 1));
                if source.exists() {
                    if dest.exists() {
                        fs::remove_file(&dest)?;
                    }
                    rename_replacing(&source, &dest)?;
                }
            }
            let dest = file.rotation_filename(&file.sibling(1));
            if dest.exists() {
                fs::remove_file(&dest)?;
            }
            let base = file.path().to_path_buf();
            file.rotate(&base, &dest)?;
        }
        if !file.delay() {
            file.open()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

#[cfg(unix)]
fn identity_of(path: &Path) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).ok().map(|m| FileIdentity {
        dev: m.dev(),
        ino: m.ino(),
    })
}

#[cfg(not(unix))]
fn identity_of(path: &Path) -> Option<FileIdentity> {
    fs::metadata(path).ok().map(|_| FileIdentity { dev: 0, ino: 0 })
}

/// Reopen the file when the path no longer refers to the file being written,
/// for example after an external tool rotated it.
#[derive(Debug, Default, Clone, Copy)]
pub struct WatchedFile {
    identity: Option<FileIdentity>,
}

impl WatchedFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RolloverPolicy for WatchedFile {
    fn attach(&mut self, file: &LogFile) -> Result<()> {
        if file.is_open() {
            self.identity = identity_of(file.path());
        }
        Ok(())
    }

    fn should_rollover(&mut self, file: &mut LogFile, _text: &str, _terminator: &str) -> Result<bool> {
        if !file.is_open() {
            return Ok(false);
        }
        let current = identity_of(file.path());
        if self.identity.is_none() {
            self.identity = current;
            return Ok(false);
        }
        Ok(current != self.identity)
    }

    fn do_rollover(&mut self, file: &mut LogFile) -> Result<()> {
        file.close()?;
        file.open()?;
        self.identity = identity_of(file.path());
        Ok(())
    }
}

/// File output composed with a rollover policy.
pub struct FileSink {
    file: LogFile,
    policy: Box<dyn RolloverPolicy>,
    terminator: String,
}

impl FileSink {
    /// Append to `path` without rotation.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Size-rotated file; append mode is forced when rotation is on.
    pub fn rotating(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> Result<Self> {
        Self::builder(path)
            .policy(SizeRotation::new(max_bytes, backup_count))
            .build()
    }

    /// Reopen on external rotation.
    pub fn watched(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).policy(WatchedFile::new()).build()
    }

    #[must_use]
    pub fn builder(path: impl Into<PathBuf>) -> FileSinkBuilder {
        FileSinkBuilder {
            path: path.into(),
            mode: FileMode::Append,
            delay: false,
            terminator: "\n".to_string(),
            policy: None,
            namer: None,
            rotator: None,
        }
    }

    pub fn file(&self) -> &LogFile {
        &self.file
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Sink for FileSink {
    fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery> {
        let text = formatter.format(record)?;
        let rolled = match self.policy.should_rollover(&mut self.file, &text, &self.terminator) {
            Ok(true) => self.policy.do_rollover(&mut self.file),
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = rolled {
            eprintln!(
                "[LOGGER ERROR] Log rotation failed for '{}': {}. Continuing with current file.",
                self.file.path().display(),
                e
            );
        }
        self.file.write_line(&text, &self.terminator)?;
        Ok(Delivery::Written)
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.file.close()
    }

    fn name(&self) -> &str {
        self.file
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Best effort flush - ignore errors during drop
        let _ = self.file.flush();
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("file", &self.file)
            .field("terminator", &self.terminator)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FileSink`]
pub struct FileSinkBuilder {
    path: PathBuf,
    mode: FileMode,
    delay: bool,
    terminator: String,
    policy: Option<Box<dyn RolloverPolicy>>,
    namer: Option<Namer>,
    rotator: Option<Rotator>,
}

impl FileSinkBuilder {
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Open the file on the first record instead of at build time
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn delay(mut self, delay: bool) -> Self {
        self.delay = delay;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn policy<P: RolloverPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn boxed_policy(mut self, policy: Box<dyn RolloverPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn namer<F>(mut self, namer: F) -> Self
    where
        F: Fn(&Path) -> PathBuf + Send + Sync + 'static,
    {
        self.namer = Some(Arc::new(namer));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn rotator<F>(mut self, rotator: F) -> Self
    where
        F: Fn(&Path, &Path) -> Result<()> + Send + Sync + 'static,
    {
        self.rotator = Some(Arc::new(rotator));
        self
    }

    /// Gzip rotated files, naming them `<name>.gz`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn compress(self, enabled: bool) -> Self {
        if enabled {
            self.namer(gzip_namer).rotator(gzip_rotator)
        } else {
            self
        }
    }

    pub fn build(self) -> Result<FileSink> {
        let rotating = self.policy.is_some();
        // truncating on open would destroy the history rotation keeps
        let mode = if rotating { FileMode::Append } else { self.mode };
        let mut file = LogFile::new(self.path, mode, self.delay)?;
        file.set_namer(self.namer);
        file.set_rotator(self.rotator);

        let mut policy = self.policy.unwrap_or_else(|| Box::new(NoRollover));
        policy.attach(&file)?;
        Ok(FileSink {
            file,
            policy,
            terminator: self.terminator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Handler, Level};
    use tempfile::tempdir;

    fn record(msg: &str) -> Record {
        Record::new("file", Level::INFO, msg)
    }

    #[test]
    fn test_append_and_truncate_modes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let handler = Handler::new(FileSink::new(&path).unwrap());
        handler.handle(&record("new"));
        handler.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");

        let sink = FileSink::builder(&path).mode(FileMode::Truncate).build().unwrap();
        let handler = Handler::new(sink);
        handler.handle(&record("fresh"));
        handler.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_delay_defers_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("late.log");
        let handler = Handler::new(FileSink::builder(&path).delay(true).build().unwrap());
        assert!(!path.exists());

        handler.handle(&record("now"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "now\n");
    }

    #[test]
    fn test_size_rotation_keeps_numbered_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("size.log");
        let handler = Handler::new(FileSink::rotating(&path, 12, 2).unwrap());

        for msg in ["aaaa", "bbbb", "cccc", "dddd", "eeee"] {
            handler.handle(&record(msg));
        }
        handler.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "eeee\n");
        assert_eq!(fs::read_to_string(dir.path().join("size.log.1")).unwrap(), "cccc\ndddd\n");
        assert_eq!(fs::read_to_string(dir.path().join("size.log.2")).unwrap(), "aaaa\nbbbb\n");
        assert!(!dir.path().join("size.log.3").exists());
    }

    #[test]
    fn test_zero_max_bytes_never_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flat.log");
        let handler = Handler::new(FileSink::rotating(&path, 0, 3).unwrap());
        for _ in 0..10 {
            handler.handle(&record("line"));
        }
        assert!(!dir.path().join("flat.log.1").exists());
    }

    #[test]
    fn test_zero_backups_only_reopens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.log");
        let handler = Handler::new(FileSink::rotating(&path, 6, 0).unwrap());
        handler.handle(&record("first"));
        handler.handle(&record("second"));
        handler.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(!dir.path().join("one.log.1").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_size_rotation_skips_symlinks() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("real.log");
        fs::write(&target, "").unwrap();
        let link = dir.path().join("link.log");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let handler = Handler::new(FileSink::rotating(&link, 1, 2).unwrap());
        handler.handle(&record("one"));
        handler.handle(&record("two"));
        handler.close().unwrap();

        assert!(!dir.path().join("link.log.1").exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_namer_and_rotator_hooks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hook.log");
        let sink = FileSink::builder(&path)
            .policy(SizeRotation::new(1, 1))
            .namer(|p: &Path| {
                let mut name = p.as_os_str().to_os_string();
                name.push(".bak");
                PathBuf::from(name)
            })
            .build()
            .unwrap();
        let handler = Handler::new(sink);
        handler.handle(&record("x"));
        handler.handle(&record("y"));
        handler.close().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("hook.log.1.bak")).unwrap(), "x\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_watched_file_reopens_after_move() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watched.log");
        let handler = Handler::new(FileSink::watched(&path).unwrap());
        handler.handle(&record("before"));

        fs::rename(&path, dir.path().join("moved.log")).unwrap();
        handler.handle(&record("after"));
        handler.close().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("moved.log")).unwrap(), "before\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
    }
}
