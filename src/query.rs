//! Read-only queries over a [`Catalog`]
//!
//! Listing, per-file version history, single-version export and aggregate
//! statistics. Everything here reads the catalog; only
//! [`Catalog::export_version`] touches the filesystem (one copy).
//!
//! Version indices count from the newest version: index `0` is the latest
//! capture, matching the order returned by [`Catalog::get_versions`].

use crate::catalog::{sort_by_latest_desc, Catalog};
use crate::entry::VersionRecord;
use crate::error::{HistlineError, Result};
use crate::tracked::TrackedFile;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// One row of a file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// Decoded original path
    pub path: String,
    /// Number of recorded versions
    pub versions: usize,
    /// Capture time of the latest version
    pub latest_timestamp: Option<i64>,
    /// Latest capture time as local ISO date-time
    pub latest_datetime: Option<String>,
    /// Trigger of the latest version
    pub latest_source: Option<String>,
}

impl FileSummary {
    fn from_tracked(file: &TrackedFile) -> Self {
        let latest = file.latest();
        Self {
            path: file.path.clone(),
            versions: file.version_count(),
            latest_timestamp: latest.map(|e| e.timestamp),
            latest_datetime: latest.map(|e| e.datetime()),
            latest_source: latest.and_then(|e| e.source.clone()),
        }
    }
}

/// Full version history of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersions {
    /// Resource URI as recorded in the store
    pub original_path: String,
    /// Storage directory holding the blobs
    pub storage_dir: PathBuf,
    /// Every version, newest first
    pub versions: Vec<VersionRecord>,
}

/// Outcome of a single-version export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    /// Where the version was written
    pub output_path: PathBuf,
    /// The exported version
    pub version: VersionRecord,
    /// SHA-256 of the exported content
    pub file_hash: String,
}

/// Aggregate numbers for a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStats {
    /// Number of tracked files
    pub total_files: usize,
    /// Number of versions across all files
    pub total_versions: usize,
    /// Mean versions per file, `0.0` for an empty catalog
    pub average_versions: f64,
}

impl Catalog {
    /// List tracked files, newest activity first
    ///
    /// `directory` restricts the listing to files under that directory.
    /// A `limit` of `Some(0)` is treated as no limit.
    pub fn list_files(&self, directory: Option<&Path>, limit: Option<usize>) -> Vec<FileSummary> {
        let mut files: Vec<&TrackedFile> = match directory {
            Some(dir) => self.filter_by_directory(dir),
            None => self.files().collect(),
        };
        sort_by_latest_desc(&mut files);

        if let Some(limit) = limit.filter(|l| *l > 0) {
            files.truncate(limit);
        }

        files.into_iter().map(FileSummary::from_tracked).collect()
    }

    /// Version history of one file
    ///
    /// # Errors
    ///
    /// [`HistlineError::FileNotFound`] if the path resolves to no tracked file.
    pub fn get_versions(&self, file_path: &str) -> Result<FileVersions> {
        let file = self
            .resolve(file_path)
            .ok_or_else(|| HistlineError::FileNotFound(file_path.to_string()))?;

        Ok(FileVersions {
            original_path: file.original_path.clone(),
            storage_dir: file.storage_dir.clone(),
            versions: file
                .sorted_entries(true)
                .into_iter()
                .map(|e| e.to_record())
                .collect(),
        })
    }

    /// Copy one version of a file to `output_path`
    ///
    /// Parent directories of `output_path` are created; an existing file at
    /// that location is overwritten.
    ///
    /// # Errors
    ///
    /// - [`HistlineError::FileNotFound`] if the path resolves to no tracked file
    /// - [`HistlineError::VersionIndexOutOfRange`] if `version_index` is not
    ///   below the number of versions
    /// - [`HistlineError::SnapshotMissing`] if the version's blob is gone
    #[instrument(skip(self))]
    pub fn export_version(
        &self,
        file_path: &str,
        output_path: &Path,
        version_index: usize,
    ) -> Result<ExportResult> {
        let file = self
            .resolve(file_path)
            .ok_or_else(|| HistlineError::FileNotFound(file_path.to_string()))?;

        let versions = file.sorted_entries(true);
        let entry = versions
            .get(version_index)
            .ok_or(HistlineError::VersionIndexOutOfRange {
                index: version_index,
                available: versions.len(),
            })?;

        let blob = file.content_path(entry);
        if !blob.is_file() {
            return Err(HistlineError::SnapshotMissing(blob));
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        utils::copy_preserving_times(&blob, output_path)?;
        let file_hash = utils::hash_file_content(output_path)?;

        info!("Exported version {} of {} to {:?}", version_index, file.path, output_path);
        Ok(ExportResult {
            output_path: output_path.to_path_buf(),
            version: entry.to_record(),
            file_hash,
        })
    }

    /// Totals and average versions per file
    pub fn statistics(&self) -> TimelineStats {
        let total_files = self.len();
        let total_versions = self.total_versions();
        let average_versions = if total_files == 0 {
            0.0
        } else {
            total_versions as f64 / total_files as f64
        };
        debug!("{} files, {} versions", total_files, total_versions);

        TimelineStats {
            total_files,
            total_versions,
            average_versions,
        }
    }
}
