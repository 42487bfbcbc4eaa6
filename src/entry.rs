//! Version entries: one captured snapshot of a tracked file
//!
//! A [`VersionEntry`] is read straight from an index file. Its `id` names the
//! content blob that sits next to the index in the same storage directory.

use crate::utils;
use serde::{Deserialize, Serialize};

/// One immutable snapshot record from an index file
///
/// Missing fields default rather than fail: a record without a timestamp
/// is treated as captured at the epoch, a record without an id names no
/// blob (its lookup will simply miss).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// File name of the snapshot blob inside the storage directory
    #[serde(default)]
    pub id: String,
    /// Capture time in Unix epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
    /// What triggered the capture (e.g. `undoRedo.source`, `Chat Edit`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-text detail for the trigger
    #[serde(
        default,
        rename = "sourceDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_description: Option<String>,
}

impl VersionEntry {
    /// Create an entry without trigger information
    pub fn new(id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            timestamp,
            source: None,
            source_description: None,
        }
    }

    /// Attach a trigger source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a trigger description
    pub fn with_source_description(mut self, description: impl Into<String>) -> Self {
        self.source_description = Some(description.into());
        self
    }

    /// Capture time rendered as a local ISO date-time
    pub fn datetime(&self) -> String {
        utils::format_timestamp(self.timestamp)
    }

    /// Presentation record for this entry
    pub fn to_record(&self) -> VersionRecord {
        VersionRecord {
            id: self.id.clone(),
            timestamp: self.timestamp,
            datetime: self.datetime(),
            source: self.source.clone(),
            source_description: self.source_description.clone(),
        }
    }
}

/// Serializable view of a [`VersionEntry`] with its derived local time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Snapshot blob name
    pub id: String,
    /// Capture time in epoch milliseconds
    pub timestamp: i64,
    /// Capture time as local ISO date-time
    pub datetime: String,
    /// Trigger source, if recorded
    pub source: Option<String>,
    /// Trigger description, if recorded
    pub source_description: Option<String>,
}
