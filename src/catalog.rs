//! In-memory catalog of tracked files
//!
//! The catalog maps each decoded original path to its [`TrackedFile`]. It is
//! built by [`TimelineStore::scan`](crate::TimelineStore::scan), owned by one
//! command invocation and never written back.
//!
//! Keys are kept ordered so every listing derived from the catalog is
//! deterministic for a given store.

use crate::tracked::TrackedFile;
use crate::utils;
use std::collections::BTreeMap;
use std::path::{Path, MAIN_SEPARATOR};
use tracing::debug;

/// Mapping from decoded original path to tracked file
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    files: BTreeMap<String, TrackedFile>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tracked file under its decoded path
    ///
    /// Returns the file previously stored under the same key, if any.
    pub fn insert(&mut self, file: TrackedFile) -> Option<TrackedFile> {
        self.files.insert(file.path.clone(), file)
    }

    /// Exact key lookup
    pub fn get(&self, path: &str) -> Option<&TrackedFile> {
        self.files.get(path)
    }

    /// Number of tracked files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Tracked files in key order
    pub fn files(&self) -> impl Iterator<Item = &TrackedFile> {
        self.files.values()
    }

    /// `(key, file)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrackedFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Find a file by user-supplied path
    ///
    /// The path is first tried verbatim as a key, then in its normalized
    /// absolute form (so relative paths and `..` segments work).
    pub fn resolve(&self, file_path: &str) -> Option<&TrackedFile> {
        if let Some(file) = self.files.get(file_path) {
            return Some(file);
        }
        let normalized = utils::normalize_path(Path::new(file_path));
        self.files.get(normalized.to_string_lossy().as_ref())
    }

    /// Tracked files located at or under `directory`
    ///
    /// The directory is normalized first. A key matches when it starts with
    /// the normalized directory followed by a separator, or when it is the
    /// directory itself. `/a/bcd/x` is therefore not under `/a/bc`.
    pub fn filter_by_directory(&self, directory: &Path) -> Vec<&TrackedFile> {
        let normalized = utils::normalize_path(directory);
        let normalized = normalized.to_string_lossy();
        let bare = trim_separators(&normalized);
        let prefix = if bare.ends_with(['/', MAIN_SEPARATOR]) {
            bare.to_string()
        } else {
            format!("{}{}", bare, MAIN_SEPARATOR)
        };

        let matches: Vec<&TrackedFile> = self
            .files
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix) || trim_separators(key) == bare)
            .map(|(_, file)| file)
            .collect();

        debug!("{} of {} files under {}", matches.len(), self.files.len(), bare);
        matches
    }

    /// Sum of version counts across all files
    pub fn total_versions(&self) -> usize {
        self.files.values().map(TrackedFile::version_count).sum()
    }

    /// The `n` files with the most versions, most first
    pub fn most_versioned(&self, n: usize) -> Vec<&TrackedFile> {
        let mut files: Vec<&TrackedFile> = self.files.values().collect();
        files.sort_by(|a, b| b.version_count().cmp(&a.version_count()));
        files.truncate(n);
        files
    }

    /// The `n` files with the newest latest version, newest first
    ///
    /// Files without any version sort last.
    pub fn most_recent(&self, n: usize) -> Vec<&TrackedFile> {
        let mut files: Vec<&TrackedFile> = self.files.values().collect();
        sort_by_latest_desc(&mut files);
        files.truncate(n);
        files
    }
}

impl FromIterator<TrackedFile> for Catalog {
    fn from_iter<I: IntoIterator<Item = TrackedFile>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for file in iter {
            catalog.insert(file);
        }
        catalog
    }
}

/// Sort newest latest-version first; `None` compares below any timestamp
pub(crate) fn sort_by_latest_desc(files: &mut [&TrackedFile]) {
    files.sort_by(|a, b| {
        let a = a.latest().map(|e| e.timestamp);
        let b = b.latest().map(|e| e.timestamp);
        b.cmp(&a)
    });
}

fn trim_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', MAIN_SEPARATOR]);
    // keep the filesystem root intact
    if trimmed.is_empty() {
        &path[..path.len().min(1)]
    } else {
        trimmed
    }
}
