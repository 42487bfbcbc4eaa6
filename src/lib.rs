//! # histline - Recover files from editor local history
//!
//! A library for reading the local-history ("timeline") store that VS Code
//! and its derivatives keep on disk, and for reconstructing files and whole
//! directories from it, either as they are now or as they were at any past
//! instant.
//!
//! ## Overview
//!
//! The editor saves a snapshot of a file every time it is written. Snapshots
//! live under a history root with one opaque directory per file. histline
//! lets you:
//! - List every file the history knows about, optionally under a directory
//! - Inspect the full version history of one file
//! - Export any single version of a file
//! - Rebuild a directory tree from the latest snapshots, or from the
//!   snapshots that were current at a given time
//!
//! The history store is only ever read.
//!
//! ## Architecture
//!
//! - **Store**: [`TimelineStore`] scans the history root into a [`Catalog`]
//! - **Catalog**: maps decoded original paths to [`TrackedFile`]s and answers
//!   lookups and directory filters
//! - **Queries**: listing, version history, export and statistics on the
//!   catalog
//! - **Reconstruction**: copies resolved snapshots into a mirrored tree and
//!   writes a JSON manifest
//! - **Extractor**: [`TimelineExtractor`] owns one catalog for the duration of
//!   a command
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use histline::{parse_timestamp, ExtractorBuilder};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Find the default history location for this OS and scan it
//! let extractor = ExtractorBuilder::new().build()?;
//!
//! // The project as it was on the morning of June 27th
//! let options = extractor
//!     .reconstruct_options()
//!     .at(parse_timestamp("2025-06-27T09:00:00")?);
//! let result = extractor.reconstruct(
//!     Path::new("/home/me/project"),
//!     Path::new("./project-0627"),
//!     &options,
//! )?;
//! println!(
//!     "Recovered {} files, {} did not exist yet",
//!     result.files_processed,
//!     result.skipped_files.unwrap_or(0)
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ### Exporting one version
//!
//! ```rust,no_run
//! # use histline::ExtractorBuilder;
//! # use std::path::Path;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let extractor = ExtractorBuilder::new().history_root("/tmp/History").build()?;
//! // Version 0 is the latest, 1 the one before, and so on
//! let exported = extractor.export_version("/home/me/project/src/main.rs", Path::new("./main.rs"), 2)?;
//! println!("{} from {}", exported.file_hash, exported.version.datetime);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`](Result) with [`HistlineError`].
//! Batch operations never fail because of a single bad entry: malformed
//! storage directories are skipped during a scan, and files that cannot be
//! copied are collected in [`ReconstructResult::errors`].
//!
//! ## Module Organization
//!
//! - [`store`]: on-disk store scanning
//! - [`catalog`]: lookup and directory filtering
//! - [`query`]: listing, versions, export, statistics
//! - [`reconstruct`]: directory reconstruction and manifest
//! - [`config`]: history-root discovery and file names
//! - [`timestamp`]: parsing user-supplied instants
//! - [`uri`]: resource URI decoding
//! - [`error`]: error types

// Public API modules
pub mod catalog;
pub mod config;
pub mod entry;
pub mod error;
pub mod extractor;
pub mod query;
pub mod reconstruct;
pub mod store;
pub mod timestamp;
pub mod tracked;
pub mod uri;
pub mod utils;

// Re-export main types for convenience
pub use catalog::Catalog;
pub use config::{ExtractorConfig, DEFAULT_INDEX_FILE, DEFAULT_MANIFEST_FILE};
pub use entry::{VersionEntry, VersionRecord};
pub use error::{HistlineError, Result};
pub use extractor::{ExtractorBuilder, TimelineExtractor};
pub use query::{ExportResult, FileSummary, FileVersions, TimelineStats};
pub use reconstruct::{
    FileError, Manifest, ManifestRecord, ReconstructOptions, ReconstructProgress,
    ReconstructResult,
};
pub use store::{StoreUsage, TimelineStore};
pub use timestamp::parse_timestamp;
pub use tracked::TrackedFile;
