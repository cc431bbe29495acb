//! Per-transfer progress keyed by file id.
//!
//! A session is seeded from the same records the tree is built from and is
//! advanced one whole file at a time, which is the granularity at which the
//! SDK learns that a file landed (`mark_downloaded`) or was sent.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use sendbox_protocol::{TransferDirection, TransferProgress, TransferStatus};
use sendbox_tree::TreeRecord;
use tracing::debug;

/// Tracks one upload or download (thread-safe).
#[derive(Debug)]
pub struct TransferSession {
    transfer_id: String,
    direction: TransferDirection,
    state: RwLock<SessionState>,
}

#[derive(Debug)]
struct SessionEntry {
    file_id: String,
    path: String,
    size: u64,
    finished: bool,
}

#[derive(Debug)]
struct SessionState {
    status: TransferStatus,
    /// In record order.
    entries: Vec<SessionEntry>,
    by_id: HashMap<String, usize>,
    total_bytes: u64,
    finished_bytes: u64,
    finished_files: usize,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    error: String,
}

impl SessionState {
    fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }

    fn end(&mut self, status: TransferStatus) {
        self.status = status;
        self.ended_at = Some(Instant::now());
    }
}

impl TransferSession {
    /// Creates a pending session over `files`.
    ///
    /// A file id listed twice is tracked once, with the first path and size.
    pub fn new<R, I>(transfer_id: impl Into<String>, direction: TransferDirection, files: I) -> Self
    where
        R: TreeRecord,
        I: IntoIterator<Item = R>,
    {
        let mut entries = Vec::new();
        let mut by_id = HashMap::new();
        let mut total_bytes = 0u64;
        for file in files {
            if by_id.contains_key(file.id()) {
                continue;
            }
            by_id.insert(file.id().to_string(), entries.len());
            total_bytes = total_bytes.saturating_add(file.size());
            entries.push(SessionEntry {
                file_id: file.id().to_string(),
                path: file.path().to_string(),
                size: file.size(),
                finished: false,
            });
        }

        Self {
            transfer_id: transfer_id.into(),
            direction,
            state: RwLock::new(SessionState {
                status: TransferStatus::Pending,
                entries,
                by_id,
                total_bytes,
                finished_bytes: 0,
                finished_files: 0,
                started_at: None,
                ended_at: None,
                error: String::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves a pending session to in-progress. No effect otherwise.
    pub fn start(&self) {
        let mut s = self.write();
        if s.status == TransferStatus::Pending {
            s.status = TransferStatus::InProgress;
            s.started_at = Some(Instant::now());
        }
    }

    /// Records that `file_id` has been fully transferred.
    ///
    /// Starts a pending session, and completes it once every file is
    /// finished. Returns `false` for unknown ids, files already finished,
    /// and sessions that have failed or been cancelled.
    pub fn finish_file(&self, file_id: &str) -> bool {
        let mut s = self.write();
        if matches!(s.status, TransferStatus::Failed | TransferStatus::Cancelled) {
            return false;
        }
        let Some(&index) = s.by_id.get(file_id) else {
            return false;
        };
        if s.entries[index].finished {
            return false;
        }

        if s.status == TransferStatus::Pending {
            s.status = TransferStatus::InProgress;
            s.started_at = Some(Instant::now());
        }
        s.entries[index].finished = true;
        let size = s.entries[index].size;
        s.finished_bytes = s.finished_bytes.saturating_add(size);
        s.finished_files += 1;

        if s.finished_files == s.entries.len() {
            s.end(TransferStatus::Completed);
            debug!(transfer = %self.transfer_id, files = s.finished_files, "transfer completed");
        }
        true
    }

    /// Marks the session failed. Finished sessions keep their status.
    pub fn fail(&self, err: &str) {
        let mut s = self.write();
        if !s.is_terminal() {
            s.error = err.to_string();
            s.end(TransferStatus::Failed);
        }
    }

    /// Marks the session cancelled. Finished sessions keep their status.
    pub fn cancel(&self) {
        let mut s = self.write();
        if !s.is_terminal() {
            s.end(TransferStatus::Cancelled);
        }
    }

    /// Returns a progress snapshot. `current_file` is the path of the first
    /// file not yet finished.
    pub fn progress(&self) -> TransferProgress {
        let s = self.read();
        TransferProgress {
            transfer_id: self.transfer_id.clone(),
            direction: self.direction,
            status: s.status.clone(),
            total_bytes: s.total_bytes,
            transferred_bytes: s.finished_bytes,
            current_file: s
                .entries
                .iter()
                .find(|e| !e.finished)
                .map(|e| e.path.clone())
                .unwrap_or_default(),
            error: s.error.clone(),
        }
    }

    /// Ids of files still to transfer, in record order. This is the resume set.
    pub fn pending_files(&self) -> Vec<String> {
        self.read()
            .entries
            .iter()
            .filter(|e| !e.finished)
            .map(|e| e.file_id.clone())
            .collect()
    }

    pub fn is_finished(&self, file_id: &str) -> bool {
        let s = self.read();
        s.by_id
            .get(file_id)
            .is_some_and(|&index| s.entries[index].finished)
    }

    /// Returns `true` while pending or in progress.
    pub fn is_active(&self) -> bool {
        !self.read().is_terminal()
    }

    pub fn transfer_id(&self) -> &str {
        &self.transfer_id
    }

    pub fn direction(&self) -> TransferDirection {
        self.direction
    }

    pub fn status(&self) -> TransferStatus {
        self.read().status.clone()
    }

    pub fn total_bytes(&self) -> u64 {
        self.read().total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.read().finished_bytes
    }

    pub fn file_count(&self) -> usize {
        self.read().entries.len()
    }

    pub fn finished_count(&self) -> usize {
        self.read().finished_files
    }

    /// Time since the session started, frozen once it ends.
    pub fn elapsed(&self) -> Option<Duration> {
        let s = self.read();
        let started = s.started_at?;
        Some(s.ended_at.unwrap_or_else(Instant::now) - started)
    }
}
