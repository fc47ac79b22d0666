//! Gzip namer and rotator for rotated log files
//!
//! Plug into [`FileSinkBuilder::compress`](super::FileSinkBuilder::compress)
//! or install individually with `namer`/`rotator`.

use super::file::rename_replacing;
use crate::core::{LoggerError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// `app.log.1` becomes `app.log.1.gz`
pub fn gzip_namer(default: &Path) -> PathBuf {
    let mut name = default.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Compress `source` into `dest` and remove `source`.
///
/// The archive is written to a temporary file and renamed into place, so a
/// failure never leaves a truncated `dest` behind and never loses `source`.
pub fn gzip_rotator(source: &Path, dest: &Path) -> Result<()> {
    if !source.exists() {
        return Ok(());
    }
    let mut temp = dest.as_os_str().to_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let input = File::open(source).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", source.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp.display()),
            e,
        )
    })?;
    let mut encoder = GzEncoder::new(BufWriter::with_capacity(64 * 1024, output), Compression::default());

    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer).map_err(|e| {
            let _ = fs::remove_file(&temp);
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to read from file: {}", source.display()),
                e,
            )
        })?;
        if read == 0 {
            break;
        }
        encoder.write_all(&buffer[..read]).map_err(|e| {
            let _ = fs::remove_file(&temp);
            LoggerError::io_operation("compress log file", "Failed to compress data chunk", e)
        })?;
    }

    encoder
        .finish()
        .and_then(|mut writer| writer.flush())
        .map_err(|e| {
            let _ = fs::remove_file(&temp);
            LoggerError::io_operation("compress log file", "Failed to finish compression", e)
        })?;

    rename_replacing(&temp, dest).inspect_err(|_| {
        let _ = fs::remove_file(&temp);
    })?;

    if let Err(e) = fs::remove_file(source) {
        eprintln!(
            "[LOGGER ERROR] Compressed '{}' but failed to remove it: {}",
            source.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::tempdir;

    #[test]
    fn test_gzip_namer() {
        assert_eq!(gzip_namer(Path::new("/tmp/app.log.3")), PathBuf::from("/tmp/app.log.3.gz"));
    }

    #[test]
    fn test_gzip_rotator_round_trip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("app.log");
        let dest = dir.path().join("app.log.1.gz");
        fs::write(&source, "line one\nline two\n").unwrap();

        gzip_rotator(&source, &dest).unwrap();
        assert!(!source.exists());

        let mut text = String::new();
        GzDecoder::new(File::open(&dest).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "line one\nline two\n");
    }

    #[test]
    fn test_missing_source_is_ignored() {
        let dir = tempdir().unwrap();
        gzip_rotator(&dir.path().join("absent.log"), &dir.path().join("absent.log.1.gz")).unwrap();
        assert!(!dir.path().join("absent.log.1.gz").exists());
    }
}
