//! Main extractor: one command invocation's view of the history store
//!
//! [`TimelineExtractor`] ties a resolved [`ExtractorConfig`] to the catalog
//! scanned from it and forwards every query and reconstruction to that
//! catalog. It owns the catalog exclusively; nothing is shared between
//! extractors.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use histline::{ExtractorBuilder, ReconstructOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = ExtractorBuilder::new()
//!     .history_root("~/.config/Code/User/History")
//!     .build()?;
//!
//! for file in extractor.list_files(None, Some(10)) {
//!     println!("{} ({} versions)", file.path, file.versions);
//! }
//!
//! let result = extractor.reconstruct(
//!     Path::new("/home/me/project"),
//!     Path::new("./recovered"),
//!     &extractor.reconstruct_options().at(1_751_055_000_000),
//! )?;
//! println!("Recovered {} files", result.files_processed);
//! # Ok(())
//! # }
//! ```

use crate::catalog::Catalog;
use crate::config::{self, ExtractorConfig, DEFAULT_INDEX_FILE, DEFAULT_MANIFEST_FILE};
use crate::error::Result;
use crate::query::{ExportResult, FileSummary, FileVersions, TimelineStats};
use crate::reconstruct::{ReconstructOptions, ReconstructProgress, ReconstructResult};
use crate::store::{StoreUsage, TimelineStore};
use std::path::{Path, PathBuf};
use tracing::info;

/// Catalog of one history root plus the settings it was built with
#[derive(Debug)]
pub struct TimelineExtractor {
    config: ExtractorConfig,
    store: TimelineStore,
    catalog: Catalog,
}

impl TimelineExtractor {
    /// Scan `config.history_root` and build an extractor
    ///
    /// The root is used as given; use [`ExtractorBuilder`] for default
    /// location discovery.
    pub fn open(config: ExtractorConfig) -> Result<Self> {
        let store = TimelineStore::new(&config.history_root)
            .with_index_file_name(&config.index_file_name);
        let catalog = store.scan()?;
        Ok(Self {
            config,
            store,
            catalog,
        })
    }

    /// Re-read the store, replacing the catalog
    ///
    /// Returns the number of tracked files found.
    pub fn rescan(&mut self) -> Result<usize> {
        self.catalog = self.store.scan()?;
        Ok(self.catalog.len())
    }

    /// The current catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Settings in effect
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// History root in use
    pub fn history_root(&self) -> &Path {
        &self.config.history_root
    }

    /// Reconstruction options carrying this extractor's manifest name
    pub fn reconstruct_options(&self) -> ReconstructOptions {
        ReconstructOptions {
            manifest_file_name: self.config.manifest_file_name.clone(),
            ..ReconstructOptions::default()
        }
    }

    /// See [`Catalog::list_files`]
    pub fn list_files(&self, directory: Option<&Path>, limit: Option<usize>) -> Vec<FileSummary> {
        self.catalog.list_files(directory, limit)
    }

    /// See [`Catalog::get_versions`]
    pub fn get_versions(&self, file_path: &str) -> Result<FileVersions> {
        self.catalog.get_versions(file_path)
    }

    /// See [`Catalog::export_version`]
    pub fn export_version(
        &self,
        file_path: &str,
        output_path: &Path,
        version_index: usize,
    ) -> Result<ExportResult> {
        self.catalog.export_version(file_path, output_path, version_index)
    }

    /// See [`Catalog::reconstruct`]
    pub fn reconstruct(
        &self,
        source: &Path,
        output: &Path,
        options: &ReconstructOptions,
    ) -> Result<ReconstructResult> {
        self.catalog.reconstruct(source, output, options)
    }

    /// See [`Catalog::reconstruct_with_progress`]
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
        self.catalog
            .reconstruct_with_progress(source, output, options, progress_callback)
    }

    /// See [`Catalog::statistics`]
    pub fn statistics(&self) -> TimelineStats {
        self.catalog.statistics()
    }

    /// Space taken by the history store on disk
    pub fn disk_usage(&self) -> Result<StoreUsage> {
        self.store.disk_usage()
    }
}

/// Builder for [`TimelineExtractor`]
///
/// # Default Values
///
/// - `history_root`: first existing default location for the host OS
/// - `index_file_name`: `entries.json`
/// - `manifest_file_name`: `timeline_metadata.json`
#[derive(Debug, Clone)]
pub struct ExtractorBuilder {
    history_root: Option<PathBuf>,
    index_file_name: String,
    manifest_file_name: String,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self {
            history_root: None,
            index_file_name: DEFAULT_INDEX_FILE.to_string(),
            manifest_file_name: DEFAULT_MANIFEST_FILE.to_string(),
        }
    }

    /// Use an explicit history root (a leading `~` is expanded)
    pub fn history_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_root = Some(path.into());
        self
    }

    /// Use an explicit history root if one is given
    pub fn maybe_history_root(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_root = path;
        }
        self
    }

    /// Name of the index file in each storage directory
    pub fn index_file_name(mut self, name: impl Into<String>) -> Self {
        self.index_file_name = name.into();
        self
    }

    /// Name of the manifest written by reconstructions
    pub fn manifest_file_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_file_name = name.into();
        self
    }

    /// Resolve the history root and scan it
    ///
    /// # Errors
    ///
    /// - Configuration errors from [`config::resolve_history_root`]
    /// - [`crate::HistlineError::Io`] if the root cannot be listed
    pub fn build(self) -> Result<TimelineExtractor> {
        let history_root = config::resolve_history_root(self.history_root.as_deref())?;
        info!("Using timeline path: {:?}", history_root);

        TimelineExtractor::open(ExtractorConfig {
            history_root,
            index_file_name: self.index_file_name,
            manifest_file_name: self.manifest_file_name,
        })
    }
}
