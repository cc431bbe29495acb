//! Relative path hygiene for manifest and scanned paths.
//!
//! Paths are checked segment by segment on `/`, independent of the host
//! platform, because the same manifest is materialized on every device.

use crate::TransferError;

/// Checks that `file_path` is in canonical form: `/`-separated, relative,
/// and made only of plain names.
///
/// Rejected: empty paths, a leading `/`, empty segments (`a//b`, trailing
/// `/`), `.` and `..` segments, backslashes, NUL bytes, and a leading drive
/// segment such as `C:`.
pub fn validate_relative_path(file_path: &str) -> Result<(), TransferError> {
    let invalid = |reason: &str| -> Result<(), TransferError> {
        Err(TransferError::InvalidPath(format!("{reason}: {file_path:?}")))
    };

    if file_path.is_empty() {
        return invalid("empty path");
    }
    if file_path.starts_with('/') {
        return invalid("absolute path not allowed");
    }

    for (i, segment) in file_path.split('/').enumerate() {
        match segment {
            "" => return invalid("empty path segment"),
            "." => return invalid("current-directory segment"),
            ".." => return invalid("parent directory traversal not allowed"),
            s if s.contains('\\') => return invalid("backslash in path"),
            s if s.contains('\0') => return invalid("NUL byte in path"),
            s if i == 0 && is_drive_prefix(s) => return invalid("path prefix not allowed"),
            _ => {}
        }
    }

    Ok(())
}

/// Rewrites a loosely formatted relative path into the canonical
/// `/`-separated form the tree builder expects, then validates it.
///
/// Backslashes become `/`, and `.` and empty segments are dropped.
/// Leading separators and drive letters are rejected rather than stripped.
pub fn normalize_relative_path(file_path: &str) -> Result<String, TransferError> {
    let unified = file_path.replace('\\', "/");

    if unified.starts_with('/') {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {file_path:?}"
        )));
    }

    let normalized = unified
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    validate_relative_path(&normalized)?;
    Ok(normalized)
}

fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
