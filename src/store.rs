//! On-disk timeline history store
//!
//! The history root holds one opaque subdirectory per tracked file:
//!
//! ```text
//! History/
//! ├── -3a1bc2d4/
//! │   ├── entries.json     index: resource URI + version entries
//! │   ├── AbCd.rs          content blob for entry "AbCd.rs"
//! │   └── XyZw.rs
//! └── 5f0e9a11/
//!     ├── entries.json
//!     └── ...
//! ```
//!
//! [`TimelineStore::scan`] reads every index into a [`TrackedFile`] and
//! returns the resulting [`Catalog`]. The store is only ever read.
//!
//! A subdirectory that cannot be used (no index, unreadable or malformed
//! index, empty resource) is skipped and logged; it never aborts a scan.

use crate::catalog::Catalog;
use crate::config::DEFAULT_INDEX_FILE;
use crate::entry::VersionEntry;
use crate::error::{HistlineError, Result};
use crate::tracked::TrackedFile;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Raw shape of an index file
#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    resource: String,
    #[serde(default)]
    entries: Vec<VersionEntry>,
}

/// Read-only handle on a history root
#[derive(Debug, Clone)]
pub struct TimelineStore {
    root: PathBuf,
    index_file_name: String,
}

impl TimelineStore {
    /// Open a store rooted at `root` using the default index file name
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_file_name: DEFAULT_INDEX_FILE.to_string(),
        }
    }

    /// Use a different index file name
    pub fn with_index_file_name(mut self, name: impl Into<String>) -> Self {
        self.index_file_name = name.into();
        self
    }

    /// History root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the history root and build a fresh catalog
    ///
    /// Only immediate subdirectories are considered. Subdirectories are
    /// visited in name order so that the result does not depend on the
    /// platform's directory listing order.
    ///
    /// When two storage directories record the same resource, the one whose
    /// latest entry is newer wins; a directory with an older history never
    /// replaces one already scanned. Only on equal latest timestamps does
    /// the directory visited later (by name) take over, so this is not a
    /// plain last-visited-wins merge.
    ///
    /// # Errors
    ///
    /// Only a failure to list the root itself is returned; everything
    /// below it is skipped and logged.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> Result<Catalog> {
        info!("Scanning timeline directory: {:?}", self.root);

        let mut dirs = Vec::new();
        for item in fs::read_dir(&self.root)? {
            match item {
                Ok(item) => {
                    let path = item.path();
                    if path.is_dir() {
                        dirs.push(path);
                    }
                }
                Err(e) => warn!("Skipping unreadable entry in {:?}: {}", self.root, e),
            }
        }
        dirs.sort();

        let mut catalog = Catalog::new();
        for dir in dirs {
            match self.load_tracked_file(&dir) {
                Ok(Some(file)) => {
                    let candidate = file.latest().map(|e| e.timestamp);
                    let shadowed = catalog
                        .get(&file.path)
                        .is_some_and(|existing| existing.latest().map(|e| e.timestamp) > candidate);
                    if shadowed {
                        debug!("Ignoring {:?}: {} is already tracked with newer versions", dir, file.path);
                    } else {
                        catalog.insert(file);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Error parsing {:?}: {}", dir, e),
            }
        }

        info!("Found {} files in timeline", catalog.len());
        Ok(catalog)
    }

    /// Parse one storage directory
    ///
    /// Returns `Ok(None)` when the directory is not a tracked-file store
    /// (no index) or its index names no resource.
    pub fn load_tracked_file(&self, dir: &Path) -> Result<Option<TrackedFile>> {
        let index_path = dir.join(&self.index_file_name);
        if !index_path.is_file() {
            debug!("No {} in {:?}, skipping", self.index_file_name, dir);
            return Ok(None);
        }

        let content = fs::read_to_string(&index_path)
            .map_err(|e| HistlineError::invalid_index(&index_path, e.to_string()))?;
        let index: IndexFile = serde_json::from_str(&content)
            .map_err(|e| HistlineError::invalid_index(&index_path, e.to_string()))?;

        if index.resource.is_empty() {
            debug!("Index {:?} has no resource, skipping", index_path);
            return Ok(None);
        }

        Ok(Some(TrackedFile::new(
            index.resource,
            dir.to_path_buf(),
            index.entries,
        )))
    }

    /// Total size and file count of everything under the history root
    pub fn disk_usage(&self) -> Result<StoreUsage> {
        let mut usage = StoreUsage::default();

        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                usage.directories += 1;
            } else if entry.file_type().is_file() {
                usage.files += 1;
                usage.total_size += entry.metadata()?.len();
            }
        }

        Ok(usage)
    }
}

/// Space used by a history store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreUsage {
    /// Number of storage directories (and any nested directories)
    pub directories: usize,
    /// Number of regular files, index files included
    pub files: usize,
    /// Sum of file sizes in bytes
    pub total_size: u64,
}
