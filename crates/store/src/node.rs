use chrono::{DateTime, Utc};
use sendbox_protocol::TransferFile;
use sendbox_tree::{FlatNode, NodeKind};
use serde::{Deserialize, Serialize};

/// A persisted folder or file row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNode {
    pub id: String,
    pub transfer_id: String,
    /// `None` for top-level nodes.
    pub parent_folder_id: Option<String>,
    pub name: String,
    /// Full relative path; for folders, the path up to and including
    /// the folder itself.
    pub path: String,
    pub size: u64,
    pub is_folder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StoredNode {
    /// Converts a flat tree row into a storage row for `transfer_id`.
    pub fn from_flat(transfer_id: &str, node: FlatNode<TransferFile>) -> Self {
        let is_folder = node.is_folder();
        let (mime_type, local_path, thumbnail_path) = match node.kind {
            NodeKind::File(file) => (file.mime_type, file.local_path, file.thumbnail_path),
            NodeKind::Folder => (None, None, None),
        };
        Self {
            id: node.id,
            transfer_id: transfer_id.to_string(),
            parent_folder_id: node.parent_folder_id,
            name: node.name,
            path: node.path,
            size: node.size,
            is_folder,
            mime_type,
            local_path,
            thumbnail_path,
            updated_at: Utc::now(),
        }
    }
}
