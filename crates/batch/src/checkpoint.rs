//! Durable record of processed point identifiers
//!
//! The checkpoint is an append-only text log with one identifier per line.
//! Every append is flushed and synced before returning. A torn final line
//! left by a crash has no terminating newline; it is dropped on the next
//! load, so that point is simply processed again.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use crate::error::Result;

/// Set of processed identifiers backed by an append-only log
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    done: HashSet<u64>,
    log: File,
}

impl Checkpoint {
    /// Load the log at `path`, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (done, complete_len) = if path.exists() {
            load(&path)?
        } else {
            (HashSet::new(), 0)
        };

        let log = OpenOptions::new().create(true).append(true).open(&path)?;
        if log.metadata()?.len() > complete_len {
            warn!(path = %path.display(), "dropping torn checkpoint entry");
            log.set_len(complete_len)?;
            log.sync_data()?;
        }

        debug!(path = %path.display(), count = done.len(), "checkpoint loaded");
        Ok(Self { path, done, log })
    }

    pub fn contains(&self, id: u64) -> bool {
        self.done.contains(&id)
    }

    /// Record `id` durably. Recording an identifier twice is a no-op.
    pub fn record(&mut self, id: u64) -> Result<()> {
        if self.done.insert(id) {
            writeln!(self.log, "{}", id)?;
            self.log.flush()?;
            self.log.sync_data()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Identifiers in the log and the byte length of its complete lines
fn load(path: &Path) -> Result<(HashSet<u64>, u64)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut done = HashSet::new();
    let mut line = String::new();
    let mut complete_len = 0_u64;
    let mut number = 0;
    loop {
        let read = reader.read_line(&mut line)?;
        if read == 0 || !line.ends_with('\n') {
            break;
        }
        number += 1;
        complete_len += read as u64;

        let entry = line.trim();
        if !entry.is_empty() {
            match entry.parse::<u64>() {
                Ok(id) => {
                    done.insert(id);
                }
                Err(_) => warn!(
                    path = %path.display(),
                    line = number,
                    content = entry,
                    "skipping unreadable checkpoint entry"
                ),
            }
        }
        line.clear();
    }
    Ok((done, complete_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::open(dir.path().join("done.log")).unwrap();
        assert!(checkpoint.is_empty());
        assert!(checkpoint.path().exists());
    }

    #[test]
    fn test_record_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("done.log");
        {
            let mut checkpoint = Checkpoint::open(&path).unwrap();
            checkpoint.record(42).unwrap();
            checkpoint.record(7).unwrap();
            checkpoint.record(42).unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "42\n7\n");

        let checkpoint = Checkpoint::open(&path).unwrap();
        assert_eq!(checkpoint.len(), 2);
        assert!(checkpoint.contains(42));
        assert!(checkpoint.contains(7));
        assert!(!checkpoint.contains(8));
    }

    #[test]
    fn test_torn_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("done.log");
        std::fs::write(&path, "1\n2\nx\n12").unwrap();

        let mut checkpoint = Checkpoint::open(&path).unwrap();
        assert_eq!(checkpoint.len(), 2);
        assert!(!checkpoint.contains(12), "unterminated entry must not count");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n2\nx\n");

        checkpoint.record(4).unwrap();
        drop(checkpoint);
        let reopened = Checkpoint::open(&path).unwrap();
        assert!(reopened.contains(4));
        assert!(!reopened.contains(12));
        assert_eq!(reopened.len(), 3);
    }
}
