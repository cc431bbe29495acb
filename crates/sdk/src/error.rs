//! SDK error types.

/// Errors produced by SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] sendbox_transfer::TransferError),

    #[error("store error: {0}")]
    Store(#[from] sendbox_store::StoreError),

    #[error("background task failed: {0}")]
    Task(String),
}
