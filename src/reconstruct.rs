//! Directory reconstruction from timeline snapshots
//!
//! Rebuilds a directory tree out of the history store: every tracked file
//! under a source directory is resolved to one version (the latest, or the
//! one current at a requested instant), and that version's blob is copied
//! into a mirrored tree below the output directory.
//!
//! ## Per-file outcomes
//!
//! Each file ends up in exactly one bucket:
//!
//! - **processed**: copied, listed in [`ReconstructResult::files`]
//! - **skipped**: no version at the requested instant, or no usable path
//!   relative to the source directory
//! - **error**: the blob is missing or the copy failed; recorded in
//!   [`ReconstructResult::errors`]
//!
//! A failing file never stops the others. Only failing to create the output
//! directory or to write the manifest aborts the run.
//!
//! ## Manifest
//!
//! When metadata export is enabled and at least one file was copied, a JSON
//! manifest (`timeline_metadata.json` by default) is written at the output
//! root describing which version every file came from.

use crate::catalog::Catalog;
use crate::config::DEFAULT_MANIFEST_FILE;
use crate::entry::VersionEntry;
use crate::error::{HistlineError, Result};
use crate::tracked::TrackedFile;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace, warn};

/// Options controlling a reconstruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructOptions {
    /// Write a manifest next to the reconstructed files
    pub export_metadata: bool,
    /// Reconstruct as of this instant (epoch milliseconds) instead of latest
    pub at: Option<i64>,
    /// File name of the manifest
    pub manifest_file_name: String,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            export_metadata: true,
            at: None,
            manifest_file_name: DEFAULT_MANIFEST_FILE.to_string(),
        }
    }
}

impl ReconstructOptions {
    /// Reconstruct as of `timestamp_ms`
    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.at = Some(timestamp_ms);
        self
    }

    /// Enable or disable the manifest
    pub fn export_metadata(mut self, export: bool) -> Self {
        self.export_metadata = export;
        self
    }
}

/// Progress of a running reconstruction
#[derive(Debug, Clone)]
pub struct ReconstructProgress {
    /// File currently being handled
    pub current_item: String,
    /// Files handled so far, this one included
    pub processed: usize,
    /// Files selected for reconstruction
    pub total: usize,
}

impl ReconstructProgress {
    /// Progress as a percentage (0-100)
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }
}

/// A file that could not be reconstructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    /// Decoded original path
    pub file: String,
    /// What went wrong
    pub error: String,
}

/// Summary of a reconstruction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructResult {
    /// Whether the run completed (per-file errors do not clear this)
    pub success: bool,
    /// Root of the reconstructed tree
    pub output_directory: PathBuf,
    /// Number of files copied
    pub files_processed: usize,
    /// Copied files, relative to the output directory, in catalog order
    pub files: Vec<String>,
    /// Files that failed
    pub errors: Vec<FileError>,
    /// Requested instant as local ISO date-time, for point-in-time runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconstructed_at: Option<String>,
    /// Files without a version at the requested instant, for point-in-time runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_files: Option<usize>,
}

/// Manifest entry for one copied file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Resource URI as recorded in the store
    pub original_path: String,
    /// Path below the output directory
    pub relative_path: String,
    /// Always `"timeline"`
    pub source: String,
    /// Capture time of the copied version
    pub timestamp: i64,
    /// Capture time as local ISO date-time
    pub datetime: String,
    /// SHA-256 of the copied content, if it could be computed
    pub file_hash: Option<String>,
    /// Trigger of the copied version
    pub entry_source: Option<String>,
    /// Number of versions the file has in the store
    pub total_versions: usize,
}

/// Manifest written at the root of a reconstructed tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Source directory as given by the caller
    pub source_directory: String,
    /// Wall-clock time of the run
    pub extraction_time: String,
    /// Number of records in `files`
    pub total_files: usize,
    /// One record per copied file
    pub files: Vec<ManifestRecord>,
    /// Requested instant, for point-in-time runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconstructed_at_timestamp: Option<i64>,
    /// Requested instant as local ISO date-time, for point-in-time runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconstructed_at_datetime: Option<String>,
}

enum Outcome {
    Processed {
        relative_path: String,
        record: Option<ManifestRecord>,
    },
    Skipped,
}

impl Catalog {
    /// Reconstruct `source` into `output`
    ///
    /// # Errors
    ///
    /// - [`HistlineError::NothingToReconstruct`] if no tracked file lies under
    ///   `source`; nothing is created in that case
    /// - [`HistlineError::Io`] if `output` or the manifest cannot be written
    pub fn reconstruct(
        &self,
        source: &Path,
        output: &Path,
        options: &ReconstructOptions,
    ) -> Result<ReconstructResult> {
        self.reconstruct_with_progress::<fn(ReconstructProgress)>(source, output, options, None)
    }

    /// [`Catalog::reconstruct`] with a callback invoked after each file
    #[instrument(skip(self, options, progress_callback), fields(at = ?options.at))]
    pub fn reconstruct_with_progress<F>(
        &self,
        source: &Path,
        output: &Path,
        options: &ReconstructOptions,
        progress_callback: Option<F>,
    ) -> Result<ReconstructResult>
    where
        F: Fn(ReconstructProgress),
    {
        let selected = self.filter_by_directory(source);
        if selected.is_empty() {
            return Err(HistlineError::NothingToReconstruct(
                source.display().to_string(),
            ));
        }
        info!("Reconstructing {} files from {:?} into {:?}", selected.len(), source, output);

        fs::create_dir_all(output)?;
        let source_root = utils::normalize_path(source);

        let mut files = Vec::new();
        let mut records = Vec::new();
        let mut errors = Vec::new();
        let mut skipped = 0;

        for (i, file) in selected.iter().enumerate() {
            match self.reconstruct_one(file, &source_root, output, options) {
                Ok(Outcome::Processed { relative_path, record }) => {
                    files.push(relative_path);
                    records.extend(record);
                }
                Ok(Outcome::Skipped) => skipped += 1,
                Err(e) => {
                    warn!("Failed to reconstruct {}: {}", file.path, e);
                    errors.push(FileError {
                        file: file.path.clone(),
                        error: e.to_string(),
                    });
                }
            }

            if let Some(ref callback) = progress_callback {
                callback(ReconstructProgress {
                    current_item: file.path.clone(),
                    processed: i + 1,
                    total: selected.len(),
                });
            }
        }

        let reconstructed_at = options.at.map(utils::format_timestamp);

        if options.export_metadata && !records.is_empty() {
            let manifest = Manifest {
                source_directory: source.display().to_string(),
                extraction_time: utils::now_iso(),
                total_files: records.len(),
                files: records,
                reconstructed_at_timestamp: options.at,
                reconstructed_at_datetime: reconstructed_at.clone(),
            };
            let manifest_path = output.join(&options.manifest_file_name);
            let json = serde_json::to_vec_pretty(&manifest)?;
            utils::atomic_write(&manifest_path, &json)?;
            debug!("Wrote manifest {:?}", manifest_path);
        }

        info!(
            "Reconstructed {} files ({} skipped, {} errors)",
            files.len(),
            skipped,
            errors.len()
        );

        Ok(ReconstructResult {
            success: true,
            output_directory: output.to_path_buf(),
            files_processed: files.len(),
            files,
            errors,
            reconstructed_at,
            skipped_files: options.at.map(|_| skipped),
        })
    }

    fn reconstruct_one(
        &self,
        file: &TrackedFile,
        source_root: &Path,
        output: &Path,
        options: &ReconstructOptions,
    ) -> Result<Outcome> {
        let entry = match select_entry(file, options.at) {
            Some(entry) => entry,
            None => {
                debug!("No version of {} at the requested time, skipping", file.path);
                return Ok(Outcome::Skipped);
            }
        };

        let relative = match utils::relative_to(&file.path, source_root) {
            Some(relative) => relative,
            None => {
                debug!("Cannot place {} under {:?}, skipping", file.path, source_root);
                return Ok(Outcome::Skipped);
            }
        };

        let destination = output.join(&relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let blob = file.content_path(entry);
        if !blob.is_file() {
            return Err(HistlineError::SnapshotMissing(blob));
        }
        utils::copy_preserving_times(&blob, &destination)?;
        trace!("{} <- {}", relative.display(), entry.id);

        let relative_path = relative.to_string_lossy().to_string();
        let record = options.export_metadata.then(|| ManifestRecord {
            original_path: file.original_path.clone(),
            relative_path: relative_path.clone(),
            source: "timeline".to_string(),
            timestamp: entry.timestamp,
            datetime: entry.datetime(),
            file_hash: utils::hash_file_content(&destination).ok(),
            entry_source: entry.source.clone(),
            total_versions: file.version_count(),
        });

        Ok(Outcome::Processed {
            relative_path,
            record,
        })
    }
}

fn select_entry(file: &TrackedFile, at: Option<i64>) -> Option<&VersionEntry> {
    match at {
        Some(instant) => file.entry_at_or_before(instant),
        None => file.latest(),
    }
}
