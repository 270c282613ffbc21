//! Incremental log file tailer.
//!
//! Reads only the bytes appended to a file since the last read.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::error::MonitorError;

/// One batch of newly appended content.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Non-blank, trimmed lines in file order.
    pub lines: Vec<String>,
    /// FNV-1a hash of the raw appended bytes, used for duplicate detection.
    pub hash: u64,
}

/// Incremental file reader that tracks a byte read offset.
///
/// The offset only moves forward after a successful read; a failed read
/// leaves it untouched so the next change notification retries the same
/// range. Truncation (file smaller than the offset) resets it to zero.
#[derive(Debug)]
pub struct LogTailer {
    /// Path to the log file.
    path: PathBuf,
    /// Byte offset up to which content has been consumed.
    offset: u64,
}

impl LogTailer {
    /// Create a tailer starting at the given offset.
    ///
    /// Files are tailed from the point monitoring starts, so callers seed
    /// the offset with the file's current size.
    #[must_use]
    pub fn new(path: PathBuf, offset: u64) -> Self {
        Self { path, offset }
    }

    /// Current byte offset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Path being tailed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reset the offset to the beginning of the file.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Read content appended since the last read.
    ///
    /// Returns `None` when the file has not grown (covers spurious change
    /// notifications). If the file is now smaller than the offset the
    /// offset is reset to zero first, so rewritten content is picked up
    /// from the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read; the offset is
    /// left unchanged in that case.
    pub async fn read_appended(&mut self) -> Result<Option<Chunk>, MonitorError> {
        let file = match File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MonitorError::FileDeleted(self.path.clone()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(MonitorError::PermissionDenied(self.path.clone()));
            }
            Err(e) => return Err(MonitorError::Io(e)),
        };

        let metadata = file.metadata().await?;
        let file_len = metadata.len();

        if file_len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_len = file_len,
                "File truncated, resetting offset to 0"
            );
            self.offset = 0;
        }

        if file_len == self.offset {
            return Ok(None);
        }

        let mut file = file;
        file.seek(std::io::SeekFrom::Start(self.offset)).await?;

        let span = file_len - self.offset;
        let mut buf = Vec::with_capacity(usize::try_from(span).unwrap_or(0));
        file.take(span).read_to_end(&mut buf).await?;

        if buf.is_empty() {
            return Ok(None);
        }

        // Advance by what was actually read; the file may have changed
        // again between the stat and the read.
        self.offset += buf.len() as u64;

        let text = String::from_utf8_lossy(&buf);
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();

        Ok(Some(Chunk {
            lines,
            hash: fnv1a(&buf),
        }))
    }
}

/// FNV-1a 64-bit content hash.
///
/// Fast and stable; duplicate detection is a same-process optimization, not
/// a security boundary.
#[must_use]
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
