//! Remote document-library items
//!
//! Immutable snapshots returned by listing calls. None of these types outlive
//! the processing of the call that produced them.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A file or folder in the remote document library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DriveItemWire")]
pub struct RemoteItem {
    /// Opaque item identifier
    pub id: String,
    /// Display name including extension
    pub name: String,
    /// Whether the item carries a folder facet
    pub is_folder: bool,
}

impl RemoteItem {
    /// Create an item snapshot
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_folder: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_folder,
        }
    }

    /// Lower-cased extension including the leading dot, or empty
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default()
    }
}

/// Wire shape of a drive item; folders carry a `folder` facet object
#[derive(Deserialize)]
struct DriveItemWire {
    id: String,
    name: String,
    #[serde(default)]
    folder: Option<serde_json::Value>,
}

impl From<DriveItemWire> for RemoteItem {
    fn from(wire: DriveItemWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            is_folder: wire.folder.is_some(),
        }
    }
}

/// A package folder listed together with its list-item metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageItem {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "listItem")]
    pub list_item: Option<ListItemMetadata>,
}

impl PackageItem {
    /// Whether the package is already marked as parsed
    pub fn is_parsed(&self) -> bool {
        self.list_item
            .as_ref()
            .map(|li| li.fields.parsed)
            .unwrap_or(false)
    }
}

/// Expanded list-item facet of a package folder
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListItemMetadata {
    #[serde(default)]
    pub fields: ListItemFields,
}

/// Custom columns of the document library
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListItemFields {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "Parsed")]
    pub parsed: bool,
    #[serde(default, rename = "ContentType")]
    pub content_type: Option<String>,
}

/// One page of a listing response
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "value", default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub continuation: Option<String>,
}

/// Echo of a status patch on a list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    #[serde(rename = "ProcessStatus")]
    pub process_status: String,
}
