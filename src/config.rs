//! Configuration and history-root discovery
//!
//! The editor keeps its local history under its user-data directory, at a
//! location that depends on the operating system and on the editor build
//! (stable, Insiders, VSCodium, remote server). When no root is given
//! explicitly, the candidates for the host OS are tried in order and the
//! first existing one wins.

use crate::error::{HistlineError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Index file present in every storage directory
pub const DEFAULT_INDEX_FILE: &str = "entries.json";

/// Manifest written at the root of a reconstructed tree
pub const DEFAULT_MANIFEST_FILE: &str = "timeline_metadata.json";

const EDITOR_DIRS: &[&str] = &["Code", "Code - Insiders", "VSCodium"];

/// Settings for one extractor invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// History root directory
    pub history_root: PathBuf,
    /// Name of the index file inside each storage directory
    pub index_file_name: String,
    /// Name of the manifest written by reconstructions
    pub manifest_file_name: String,
}

impl ExtractorConfig {
    /// Configuration for `history_root` with default file names
    pub fn new(history_root: impl Into<PathBuf>) -> Self {
        Self {
            history_root: history_root.into(),
            index_file_name: DEFAULT_INDEX_FILE.to_string(),
            manifest_file_name: DEFAULT_MANIFEST_FILE.to_string(),
        }
    }
}

/// Default history locations for an operating system
///
/// `os` uses the values of [`std::env::consts::OS`].
///
/// # Errors
///
/// [`HistlineError::UnsupportedPlatform`] for anything other than
/// `macos`, `linux` or `windows`.
pub fn history_candidates_for(os: &str) -> Result<Vec<PathBuf>> {
    let home = dirs::home_dir();
    let candidates: Vec<PathBuf> = match os {
        "macos" => home
            .map(|home| {
                EDITOR_DIRS
                    .iter()
                    .map(|editor| {
                        home.join("Library/Application Support")
                            .join(editor)
                            .join("User/History")
                    })
                    .collect()
            })
            .unwrap_or_default(),
        "linux" => home
            .map(|home| {
                let mut paths: Vec<PathBuf> = EDITOR_DIRS
                    .iter()
                    .map(|editor| home.join(".config").join(editor).join("User/History"))
                    .collect();
                paths.push(home.join(".vscode-server/data/User/History"));
                paths
            })
            .unwrap_or_default(),
        "windows" => env::var_os("APPDATA")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .map(|appdata| {
                EDITOR_DIRS
                    .iter()
                    .map(|editor| appdata.join(editor).join("User").join("History"))
                    .collect()
            })
            .unwrap_or_default(),
        other => return Err(HistlineError::UnsupportedPlatform(other.to_string())),
    };
    Ok(candidates)
}

/// Resolve the history root for this invocation
///
/// An explicit path is used as-is after `~` expansion and must exist.
/// Otherwise the host's default candidates are tried in order.
///
/// # Errors
///
/// - [`HistlineError::HistoryRootMissing`] if an explicit path does not exist
/// - [`HistlineError::HistoryRootNotFound`] if no default candidate exists
/// - [`HistlineError::UnsupportedPlatform`] on an unknown host OS
pub fn resolve_history_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let expanded = expand_tilde(path);
        if !expanded.exists() {
            return Err(HistlineError::HistoryRootMissing(expanded));
        }
        return Ok(expanded);
    }

    let candidates = history_candidates_for(env::consts::OS)?;
    first_existing(candidates)
}

fn first_existing(candidates: Vec<PathBuf>) -> Result<PathBuf> {
    match candidates.iter().find(|c| c.is_dir()) {
        Some(found) => {
            debug!("Using default timeline path: {:?}", found);
            Ok(found.clone())
        }
        None => Err(HistlineError::HistoryRootNotFound { tried: candidates }),
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
