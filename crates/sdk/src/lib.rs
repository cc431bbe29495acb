//! sendbox SDK core.
//!
//! Glues the tree builder to local file picking and local persistence.
//! Library only: the host app supplies manifests parsed from the transfer
//! API and renders the resulting trees.
//!
//! # Pipelines
//!
//! 1. **Upload**: scan a local directory, normalize paths, build an
//!    in-memory tree for display and a session for progress.
//! 2. **Download**: normalize a manifest's paths, build flat rows under the
//!    transfer id, and replace the transfer's rows in the local store in one
//!    write.

pub mod config;
pub mod error;
pub mod logging;
pub mod sdk;

pub use config::SdkConfig;
pub use error::SdkError;
pub use logging::init_logging;
pub use sdk::{TransferSdk, UploadPlan};
