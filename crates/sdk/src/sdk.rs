//! Upload preparation and download materialization.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use sendbox_protocol::{TransferDirection, TransferFile, TransferManifest};
use sendbox_store::{NodeStore, StoredNode};
use sendbox_transfer::{
    LocalFile, TransferError, TransferSession, normalize_relative_path, scan_directory,
};
use sendbox_tree::{FileTree, PathTreeBuilder};
use tracing::{debug, info};

use crate::config::{SdkConfig, default_config_path};
use crate::error::SdkError;
use crate::logging::init_logging;

/// A local directory ready to be uploaded.
pub struct UploadPlan {
    pub upload_id: String,
    /// Picked files as a tree, folders first at every level.
    pub tree: FileTree<LocalFile>,
    pub session: Arc<TransferSession>,
}

impl UploadPlan {
    /// Builds the manifest to announce to the transfer API, files in tree order.
    pub fn manifest(&self, title: Option<String>) -> TransferManifest {
        let files = self
            .tree
            .walk()
            .filter_map(|(id, _)| self.tree.node(id).record())
            .map(LocalFile::to_transfer_file)
            .collect();
        TransferManifest {
            transfer_id: self.upload_id.clone(),
            title,
            files,
        }
    }
}

/// Entry point for host apps. Cheap to clone.
#[derive(Clone)]
pub struct TransferSdk {
    config: Arc<SdkConfig>,
    store: Arc<NodeStore>,
    /// Live download sessions by transfer id.
    sessions: Arc<RwLock<HashMap<String, Arc<TransferSession>>>>,
}

impl TransferSdk {
    /// Opens the local store described by `config`.
    pub fn open(config: SdkConfig) -> Result<Self, SdkError> {
        let store = NodeStore::open(config.store_path())?;
        info!(
            store = %config.store_path().display(),
            nodes = store.len(),
            "sdk opened"
        );
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Host bootstrap: loads the config file (`path`, or the platform
    /// default), installs logging with its `log_filter`, and opens the SDK.
    pub fn from_config_file(path: Option<&Path>) -> Result<Self, SdkError> {
        let config = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => SdkConfig::load(&path)?,
            None => SdkConfig::default(),
        };
        init_logging(&config.log_filter);
        Self::open(config)
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    fn builder(&self, namespace: &str) -> PathTreeBuilder {
        PathTreeBuilder::new(namespace).with_id_policy(self.config.folder_id_policy)
    }

    /// Scans `root` and prepares an upload of everything below it.
    pub fn prepare_upload(&self, root: &Path) -> Result<UploadPlan, SdkError> {
        let scan = scan_directory(root)?;
        let files = scan
            .files
            .into_iter()
            .map(|mut file| {
                file.relative_path = normalize_relative_path(&file.relative_path)?;
                Ok(file)
            })
            .collect::<Result<Vec<_>, TransferError>>()?;

        let upload_id = uuid::Uuid::new_v4().to_string();
        let session = TransferSession::new(upload_id.clone(), TransferDirection::Upload, &files);

        let mut tree = self.builder(&upload_id).build_tree(files);
        tree.sort_folders_first();

        info!(
            upload = %upload_id,
            files = tree.file_count(),
            folders = tree.folder_count(),
            total_size = scan.total_size,
            "prepared upload"
        );
        Ok(UploadPlan {
            upload_id,
            tree,
            session: Arc::new(session),
        })
    }

    /// Builds an in-memory tree of a manifest for display, without storing it.
    pub fn preview_download(
        &self,
        manifest: &TransferManifest,
    ) -> Result<FileTree<TransferFile>, SdkError> {
        let files = normalized_files(manifest)?;
        let mut tree = self.builder(&manifest.transfer_id).build_tree(files);
        tree.sort_folders_first();
        Ok(tree)
    }

    /// Materializes a manifest into the local store.
    ///
    /// The transfer's previous rows are replaced in one write; rows no longer
    /// in the manifest are dropped. Local paths recorded for files that are
    /// still present survive the rebuild.
    pub fn materialize_download(
        &self,
        manifest: &TransferManifest,
    ) -> Result<Vec<StoredNode>, SdkError> {
        let files = normalized_files(manifest)?;
        let transfer_id = manifest.transfer_id.as_str();

        let rows: Vec<StoredNode> = self
            .builder(transfer_id)
            .build_flat(files)
            .into_iter()
            .map(|row| StoredNode::from_flat(transfer_id, row))
            .collect();

        let replaced = self.store.replace_transfer(transfer_id, rows)?;
        info!(
            transfer = %transfer_id,
            nodes = replaced.rows.len(),
            removed = replaced.removed,
            "materialized download"
        );
        Ok(replaced.rows)
    }

    /// [`materialize_download`](Self::materialize_download) on tokio's
    /// blocking pool.
    pub async fn materialize_download_async(
        &self,
        manifest: TransferManifest,
    ) -> Result<Vec<StoredNode>, SdkError> {
        let sdk = self.clone();
        tokio::task::spawn_blocking(move || sdk.materialize_download(&manifest))
            .await
            .map_err(|e| SdkError::Task(e.to_string()))?
    }

    /// Creates the session tracking the download of `manifest` and registers
    /// it under the transfer id, replacing any earlier one.
    ///
    /// Paths are normalized like [`materialize_download`](Self::materialize_download)
    /// and the same manifests are rejected. Files already stored with a local
    /// path count as finished, so the pending set is what is left to fetch.
    pub fn download_session(
        &self,
        manifest: &TransferManifest,
    ) -> Result<Arc<TransferSession>, SdkError> {
        let files = normalized_files(manifest)?;
        let transfer_id = manifest.transfer_id.as_str();
        let session = Arc::new(TransferSession::new(
            transfer_id,
            TransferDirection::Download,
            &files,
        ));

        for node in self.store.nodes_for_transfer(transfer_id) {
            if !node.is_folder && node.local_path.is_some() {
                session.finish_file(&node.id);
            }
        }

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(transfer_id.to_string(), Arc::clone(&session));
        debug!(
            transfer = %transfer_id,
            files = session.file_count(),
            pending = session.file_count() - session.finished_count(),
            "download session opened"
        );
        Ok(session)
    }

    /// The registered download session of a transfer, if any.
    pub fn session(&self, transfer_id: &str) -> Option<Arc<TransferSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(transfer_id)
            .cloned()
    }

    /// Lists the stored children of a folder (`None` for the top level).
    pub fn browse(&self, transfer_id: &str, folder_id: Option<&str>) -> Vec<StoredNode> {
        self.store.children(transfer_id, folder_id)
    }

    /// Records that a file has been written to `local_path` and advances the
    /// transfer's download session, if one is open.
    pub fn mark_downloaded(&self, file_id: &str, local_path: &Path) -> Result<(), SdkError> {
        self.store
            .set_local_path(file_id, &local_path.to_string_lossy())?;
        if let Some(session) = self
            .store
            .get(file_id)
            .and_then(|node| self.session(&node.transfer_id))
        {
            session.finish_file(file_id);
        }
        debug!(file = %file_id, path = %local_path.display(), "file downloaded");
        Ok(())
    }

    /// Drops every stored row of a transfer.
    pub fn forget_transfer(&self, transfer_id: &str) -> Result<usize, SdkError> {
        let removed = self.store.delete_transfer(transfer_id)?;
        if let Some(session) = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(transfer_id)
        {
            session.cancel();
        }
        Ok(removed)
    }
}

/// Copies the manifest's files with canonical paths; rejects unsafe ones.
fn normalized_files(manifest: &TransferManifest) -> Result<Vec<TransferFile>, TransferError> {
    manifest
        .files
        .iter()
        .map(|file| {
            let mut file = file.clone();
            file.path = normalize_relative_path(&file.path)?;
            Ok(file)
        })
        .collect()
}
