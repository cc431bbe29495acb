//! Transfer plumbing around the tree builder: relative-path hygiene,
//! local file picking, and per-transfer session bookkeeping.

mod scanner;
mod session;
mod validation;

pub use scanner::{LocalFile, ScanResult, scan_directory};
pub use session::TransferSession;
pub use validation::{normalize_relative_path, validate_relative_path};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),
}
