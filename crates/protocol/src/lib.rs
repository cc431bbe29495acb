//! Wire types shared between the transfer API and the SDK.

pub mod messages;
pub mod types;

pub use messages::{TransferFile, TransferManifest};
pub use types::{TransferDirection, TransferProgress, TransferStatus};
