//! Local file picking for uploads.
//!
//! Walks a directory and produces one record per regular file, with the
//! relative path normalized to forward slashes so it can go straight into
//! the tree builder and onto the wire.

use std::path::{Path, PathBuf};

use sendbox_protocol::TransferFile;
use sendbox_tree::TreeRecord;
use tracing::debug;

use crate::TransferError;

/// A file picked from local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Path relative to the scanned root, `/`-separated.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub size: u64,
    pub mime_type: Option<String>,
}

impl LocalFile {
    /// Converts to a manifest entry. The relative path doubles as the id
    /// until the server assigns one.
    pub fn to_transfer_file(&self) -> TransferFile {
        TransferFile {
            id: self.relative_path.clone(),
            path: self.relative_path.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            local_path: Some(self.absolute_path.to_string_lossy().into_owned()),
            thumbnail_path: None,
        }
    }
}

impl TreeRecord for LocalFile {
    fn id(&self) -> &str {
        &self.relative_path
    }

    fn path(&self) -> &str {
        &self.relative_path
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Result of scanning a directory.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Files sorted by relative path.
    pub files: Vec<LocalFile>,
    pub total_size: u64,
}

/// Scans `root` and returns every regular file below it.
///
/// The walk keeps an explicit stack of pending directories, so deeply
/// nested trees do not grow the call stack.
pub fn scan_directory(root: &Path) -> Result<ScanResult, TransferError> {
    if !root.is_dir() {
        return Err(TransferError::NotADirectory(root.display().to_string()));
    }

    let mut result = ScanResult::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let metadata = entry.metadata()?;

            if metadata.is_dir() {
                pending.push(path);
            } else if metadata.is_file() {
                let rel_path = path.strip_prefix(root).map_err(std::io::Error::other)?;
                let relative_path = rel_path.to_string_lossy().replace('\\', "/");
                let mime_type = mime_guess::from_path(&path)
                    .first()
                    .map(|mime| mime.essence_str().to_string());
                let size = metadata.len();

                result.total_size = result.total_size.saturating_add(size);
                result.files.push(LocalFile {
                    relative_path,
                    absolute_path: path,
                    size,
                    mime_type,
                });
            }
        }
    }

    result
        .files
        .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    debug!(
        root = %root.display(),
        files = result.files.len(),
        total_size = result.total_size,
        "scanned directory"
    );
    Ok(result)
}
