//! Transfer manifest payloads as returned by the transfer API.

use sendbox_tree::TreeRecord;
use serde::{Deserialize, Serialize};

/// A file listed in a transfer.
///
/// `path` is relative and `/`-separated; folders are implied by it and
/// never listed on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFile {
    pub id: String,
    pub path: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Where the file lives on this device, once downloaded or when picked
    /// for upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
}

impl TransferFile {
    /// Creates a file entry without optional metadata.
    pub fn new(id: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            size,
            mime_type: None,
            local_path: None,
            thumbnail_path: None,
        }
    }
}

impl TreeRecord for TransferFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// The file list of one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferManifest {
    pub transfer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub files: Vec<TransferFile>,
}

impl TransferManifest {
    /// Sum of all file sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.files
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.size))
    }
}
