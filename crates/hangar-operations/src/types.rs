use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hangar_db::models::registry::PropertyValue;
use serde::Serialize;

// ---- Revisions ----

/// A revision and the time of its newest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionInfo {
    pub revision: String,
    pub time: DateTime<Utc>,
}

impl From<PropertyValue> for RevisionInfo {
    fn from(value: PropertyValue) -> Self {
        Self {
            revision: value.value,
            time: DateTime::from_timestamp(value.created_unix, 0).unwrap_or_default(),
        }
    }
}

/// Revisions of a recipe or package, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionList {
    #[serde(skip)]
    pub reference: String,
    pub revisions: Vec<RevisionInfo>,
}

// ---- Search ----

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub results: Vec<String>,
}

// ---- Files ----

/// Files of a revision. Values are always null on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileList {
    pub files: BTreeMap<String, ()>,
}

/// Filename to blob hash.
pub type Snapshot = BTreeMap<String, String>;

/// Filename to download or upload URL.
pub type UrlMap = BTreeMap<String, String>;
