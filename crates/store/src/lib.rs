//! Local persistence for transfer contents.
//!
//! Folder and file nodes are stored as flat rows keyed by id, with
//! `parent_folder_id` expressing the hierarchy. The store is a JSON file
//! cached in memory; every write batch replaces the file atomically.

mod node;
mod store;

pub use node::StoredNode;
pub use store::{NodeStore, Replaced};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node not found: {0}")]
    NotFound(String),
}
