//! Utility functions for histline
//!
//! This module provides the small helpers shared by the store scanner, the
//! query operations and the reconstruction engine:
//!
//! ### File Operations
//! - File content hashing (SHA-256, streamed in 8KB chunks)
//! - Copying a snapshot while keeping its access/modification times
//! - Atomic file writing for the reconstruction manifest
//!
//! ### Path Manipulation
//! - Normalizing user-supplied paths to an absolute form, even when the
//!   path no longer exists on disk
//! - Deriving a path relative to a reconstruction root
//!
//! ### Display
//! - Local-time rendering of epoch milliseconds
//! - Byte and path formatting for tables
//!
//! ## Example Usage
//!
//! ```rust
//! use histline::utils::{format_bytes, relative_to};
//! use std::path::{Path, PathBuf};
//!
//! let relative = relative_to("/home/user/project/src/main.rs", Path::new("/home/user/project"));
//! assert_eq!(relative, Some(PathBuf::from("src/main.rs")));
//! assert_eq!(format_bytes(1536), "1.50 KB");
//! ```

use crate::error::Result;
use chrono::{DateTime, Local, TimeZone, Timelike};
use filetime::FileTime;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::trace;

/// Rendering used for every human-readable timestamp (local time, no offset)
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// [`ISO_FORMAT`] with microseconds, used when the fraction is non-zero
pub const ISO_FORMAT_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Hash a file's content efficiently using SHA-256
///
/// Computes the SHA-256 hash of a file's content using buffered I/O. The
/// file is read and hashed in 8KB chunks to keep memory usage flat for
/// large snapshots.
///
/// # Returns
///
/// Returns the SHA-256 hash as a 64-character hexadecimal string.
///
/// # Errors
///
/// - [`crate::HistlineError::Io`] if the file cannot be opened or read
pub fn hash_file_content(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192]; // 8KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Convert epoch milliseconds to a local date-time
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn timestamp_to_datetime(timestamp_ms: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(timestamp_ms).earliest()
}

/// Format epoch milliseconds as an ISO-8601 local date-time
///
/// Fractional seconds are only printed when non-zero, and then always with
/// six digits: `2025-06-27T14:30:00` or `2025-06-27T14:30:00.250000`.
/// Out-of-range values fall back to the raw number.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match timestamp_to_datetime(timestamp_ms) {
        Some(dt) => format_local(&dt),
        None => timestamp_ms.to_string(),
    }
}

/// Current wall-clock time in the same rendering as [`format_timestamp`]
pub fn now_iso() -> String {
    format_local(&Local::now())
}

fn format_local(dt: &DateTime<Local>) -> String {
    let naive = dt.naive_local();
    let format = if naive.nanosecond() / 1_000 == 0 {
        ISO_FORMAT
    } else {
        ISO_FORMAT_MICROS
    };
    naive.format(format).to_string()
}

/// Normalize a path to an absolute form
///
/// Relative paths are joined onto the current directory and `.`/`..`
/// components are folded lexically. The longest existing ancestor is then
/// canonicalized (resolving symlinks) and the non-existent remainder is
/// appended back, so directories that have since been deleted still
/// normalize consistently with the ones that exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other.as_os_str()),
        }
    }

    let mut existing = lexical.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut resolved = canonical;
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return lexical,
        }
    }
}

/// Derive the path of `file_path` relative to `base`
///
/// Uses a two-stage approach:
/// 1. **Structured**: component-wise prefix stripping
/// 2. **String prefix**: when the structured form fails, the raw string
///    prefix is removed and leading separators are trimmed
///
/// Returns `None` when neither stage applies, when the result would be
/// empty (the file *is* the base), or when it would climb out of `base`
/// through `..` or name an absolute location.
pub fn relative_to(file_path: &str, base: &Path) -> Option<PathBuf> {
    let relative = match Path::new(file_path).strip_prefix(base) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => {
            let base_str = base.to_string_lossy();
            let rest = file_path.strip_prefix(&*base_str)?;
            PathBuf::from(rest.trim_start_matches(['/', MAIN_SEPARATOR]))
        }
    };

    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if relative.as_os_str().is_empty() || !contained {
        None
    } else {
        Some(relative)
    }
}

/// Copy a file, carrying over its access and modification times
///
/// The destination is overwritten if it exists. Permission bits are copied
/// by [`fs::copy`]; timestamps are applied afterwards.
pub fn copy_preserving_times(src: &Path, dst: &Path) -> Result<u64> {
    let bytes = fs::copy(src, dst)?;
    let metadata = fs::metadata(src)?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    trace!("Copied {:?} -> {:?} ({} bytes)", src, dst, bytes);
    Ok(bytes)
}

/// Atomic file write (write to temp file then rename)
///
/// The target file is never observed in a partially written state.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Format bytes in human-readable form
///
/// Uses binary (1024-based) units. Values below 1 KB are printed as whole
/// numbers, everything else with two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Truncate a path for display, keeping the end
pub fn truncate_path(path: &str, max_length: usize) -> String {
    let count = path.chars().count();
    if count <= max_length {
        return path.to_string();
    }
    let keep = max_length.saturating_sub(3);
    let tail: String = path.chars().skip(count - keep).collect();
    format!("...{}", tail)
}
