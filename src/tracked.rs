//! Tracked files and their version history
//!
//! A [`TrackedFile`] aggregates every [`VersionEntry`] recorded for one
//! original file and answers the time-based questions the rest of the
//! library asks:
//!
//! - **latest** / **oldest**: the newest and first capture
//! - **entry at or before T**: the version that was current at instant T
//! - **sorted entries**: history ordered by capture time
//!
//! Entries are kept in index order; every ordering is derived on demand.
//! When several entries share a timestamp, which one `latest`, `oldest` or
//! `entry_at_or_before` returns among them is unspecified.
//!
//! ## Examples
//!
//! ```rust
//! use histline::{TrackedFile, VersionEntry};
//! use std::path::PathBuf;
//!
//! let file = TrackedFile::new(
//!     "file:///home/me/notes.md",
//!     PathBuf::from("/history/-3a1b"),
//!     vec![VersionEntry::new("a.md", 1_000), VersionEntry::new("b.md", 3_000)],
//! );
//!
//! assert_eq!(file.latest().map(|e| e.id.as_str()), Some("b.md"));
//! assert_eq!(file.entry_at_or_before(2_000).map(|e| e.id.as_str()), Some("a.md"));
//! assert!(file.entry_at_or_before(999).is_none());
//! ```

use crate::entry::VersionEntry;
use crate::error::Result;
use crate::uri;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file with its complete timeline history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Resource URI as recorded in the index file
    pub original_path: String,
    /// Decoded filesystem path, used as the catalog key
    pub path: String,
    /// Directory holding the index file and the content blobs
    pub storage_dir: PathBuf,
    /// Version entries in index order
    pub entries: Vec<VersionEntry>,
}

impl TrackedFile {
    /// Create a tracked file, decoding `original_path` into its catalog key
    pub fn new(
        original_path: impl Into<String>,
        storage_dir: PathBuf,
        entries: Vec<VersionEntry>,
    ) -> Self {
        let original_path = original_path.into();
        let path = uri::decode_resource(&original_path);
        Self {
            original_path,
            path,
            storage_dir,
            entries,
        }
    }

    /// Number of recorded versions
    pub fn version_count(&self) -> usize {
        self.entries.len()
    }

    /// Most recent entry by capture time
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.entries.iter().max_by_key(|e| e.timestamp)
    }

    /// Earliest entry by capture time
    pub fn oldest(&self) -> Option<&VersionEntry> {
        self.entries.iter().min_by_key(|e| e.timestamp)
    }

    /// The entry that was current at `timestamp_ms`
    ///
    /// Returns the newest entry not captured after the given instant, or
    /// `None` if the file had no version yet at that time.
    pub fn entry_at_or_before(&self, timestamp_ms: i64) -> Option<&VersionEntry> {
        self.entries
            .iter()
            .filter(|e| e.timestamp <= timestamp_ms)
            .max_by_key(|e| e.timestamp)
    }

    /// Entries ordered by capture time, newest first when `newest_first`
    pub fn sorted_entries(&self, newest_first: bool) -> Vec<&VersionEntry> {
        let mut sorted: Vec<&VersionEntry> = self.entries.iter().collect();
        if newest_first {
            sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        } else {
            sorted.sort_by_key(|e| e.timestamp);
        }
        sorted
    }

    /// Location of a version's content blob
    pub fn content_path(&self, entry: &VersionEntry) -> PathBuf {
        self.storage_dir.join(&entry.id)
    }

    /// SHA-256 of a version's content blob
    pub fn compute_hash(&self, entry: &VersionEntry) -> Result<String> {
        utils::hash_file_content(&self.content_path(entry))
    }

    /// Last path component of the decoded path
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.path).file_name().and_then(|n| n.to_str())
    }
}
