//! Folder/file tree reconstruction from flat path lists.
//!
//! A transfer's content arrives as a flat list of records, each with a
//! `/`-separated relative path and a byte size. [`PathTreeBuilder`] expands
//! that list into synthesized folder nodes plus the original file nodes,
//! with every folder sized as the sum of all files below it.
//!
//! Two output shapes share one build:
//!
//! - [`FileTree`]: an arena with parent/child links, for UI traversal.
//! - [`FlatNode`] rows: one per node with a `parent_folder_id`, for upsert
//!   into local storage.

mod builder;
mod flat;
mod id;
mod record;
mod tree;

#[cfg(test)]
mod testutil;

pub use builder::{PathTreeBuilder, build_flat, build_tree};
pub use flat::FlatNode;
pub use id::FolderIdPolicy;
pub use record::TreeRecord;
pub use tree::{Ancestors, FileTree, NodeId, NodeKind, TreeNode, Walk};
