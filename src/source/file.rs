//! File-based line source with live tailing support.
//!
//! Provides [`FileTailer`] for reading complete lines appended to a file
//! after it was opened.

use crate::model::error::InputError;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Incremental reader over an append-only file.
///
/// Tracks the byte offset of the last complete line consumed. Partial lines
/// (no trailing newline yet) are left in place and re-read on a later call.
#[derive(Debug)]
pub struct FileTailer {
    path: PathBuf,
    position: u64,
    reader: BufReader<File>,
}

impl FileTailer {
    /// Open `path` positioned at its current end; earlier content is never read.
    ///
    /// # Errors
    ///
    /// Returns `InputError::FileNotFound` if the file does not exist.
    /// Returns `InputError::Io` for other I/O errors.
    pub fn open_at_end(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();

        // Check if file exists before trying to open
        if !path.exists() {
            return Err(InputError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut file = File::open(path)?;
        let position = file.seek(SeekFrom::End(0))?;

        debug!(path = %path.display(), position, "Opened log file at end");

        Ok(Self {
            path: path.to_path_buf(),
            position,
            reader: BufReader::new(file),
        })
    }

    /// Path this tailer was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset just past the last consumed line.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next complete line, without its surrounding whitespace.
    ///
    /// Returns `Ok(None)` when no complete line is available yet. Invalid UTF-8
    /// is replaced rather than rejected. If the file has been truncated below the
    /// current offset, reading restarts from the beginning on the next call.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` for I/O errors.
    pub fn read_line(&mut self) -> Result<Option<String>, InputError> {
        let mut buffer = Vec::new();
        let bytes_read = self.reader.read_until(b'\n', &mut buffer)?;

        if bytes_read == 0 {
            // EOF reached
            self.check_truncation()?;
            return Ok(None);
        }

        if buffer.ends_with(b"\n") {
            self.position += bytes_read as u64;
            let line = String::from_utf8_lossy(&buffer).trim().to_string();
            Ok(Some(line))
        } else {
            // Partial line - rewind so it is read whole once the writer finishes it
            self.reader.seek(SeekFrom::Start(self.position))?;
            Ok(None)
        }
    }

    fn check_truncation(&mut self) -> Result<(), InputError> {
        let len = self.reader.get_ref().metadata()?.len();
        if len < self.position {
            info!(
                path = %self.path.display(),
                previous = self.position,
                current = len,
                "Log file truncated, reading from start"
            );
            self.position = 0;
            self.reader.seek(SeekFrom::Start(0))?;
        }
        Ok(())
    }
}
