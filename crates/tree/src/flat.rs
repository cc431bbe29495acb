//! Flat, persistence-shaped output: one row per node.

use crate::tree::NodeKind;

/// A tree node as a storage row.
///
/// Rows carry no children list; hierarchy is expressed solely through
/// `parent_folder_id`, which is `None` for top-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode<R> {
    pub id: String,
    pub parent_folder_id: Option<String>,
    /// Last path segment.
    pub name: String,
    /// Full path, e.g. `folder1/folder2` for a nested folder.
    pub path: String,
    pub size: u64,
    pub kind: NodeKind<R>,
}

impl<R> FlatNode<R> {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn record(&self) -> Option<&R> {
        match &self.kind {
            NodeKind::File(record) => Some(record),
            NodeKind::Folder => None,
        }
    }

    /// Moves the wrapped record out, `None` for folders.
    pub fn into_record(self) -> Option<R> {
        match self.kind {
            NodeKind::File(record) => Some(record),
            NodeKind::Folder => None,
        }
    }
}
