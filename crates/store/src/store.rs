use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;

use crate::StoreError;
use crate::node::StoredNode;

/// Persistent node store.
///
/// Rows are cached in memory and persisted to a JSON file. Writers hold the
/// lock across both the in-memory update and the file write, so readers
/// never observe half of a batch.
pub struct NodeStore {
    path: PathBuf,
    nodes: RwLock<HashMap<String, StoredNode>>,
}

impl NodeStore {
    /// Opens the store at `path`, loading existing rows (missing file = empty).
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let nodes = load_nodes(&path)?;
        Ok(Self {
            path,
            nodes: RwLock::new(nodes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoredNode>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoredNode>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces rows by id and persists them as one write.
    ///
    /// If the write fails, the in-memory rows are rolled back.
    pub fn upsert_nodes<I>(&self, rows: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = StoredNode>,
    {
        let mut map = self.write();
        let mut previous = Vec::new();
        for row in rows {
            let id = row.id.clone();
            previous.push((id.clone(), map.insert(id, row)));
        }
        let count = previous.len();

        if let Err(e) = persist(&self.path, &map) {
            restore(&mut map, previous);
            return Err(e);
        }

        debug!(rows = count, path = %self.path.display(), "upserted nodes");
        Ok(count)
    }

    /// Replaces the rows of one transfer with `rows` in a single write.
    ///
    /// Rows of `transfer_id` whose id is not in `rows` are dropped; rows of
    /// other transfers are untouched. A file row arriving without a
    /// `local_path` inherits the one already stored for the same id in the
    /// same transfer, so a download recorded concurrently is not lost.
    pub fn replace_transfer(
        &self,
        transfer_id: &str,
        rows: Vec<StoredNode>,
    ) -> Result<Replaced, StoreError> {
        let mut map = self.write();

        let keep: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        let stale: Vec<String> = map
            .values()
            .filter(|n| n.transfer_id == transfer_id && !keep.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        let removed = stale.len();

        let mut previous = Vec::with_capacity(removed + rows.len());
        for id in stale {
            let old = map.remove(&id);
            previous.push((id, old));
        }

        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if !row.is_folder && row.local_path.is_none() {
                row.local_path = map
                    .get(&row.id)
                    .filter(|old| old.transfer_id == row.transfer_id)
                    .and_then(|old| old.local_path.clone());
            }
            stored.push(row.clone());
            let id = row.id.clone();
            previous.push((id.clone(), map.insert(id, row)));
        }

        if let Err(e) = persist(&self.path, &map) {
            restore(&mut map, previous);
            return Err(e);
        }

        debug!(transfer = %transfer_id, rows = stored.len(), removed, "replaced transfer nodes");
        Ok(Replaced {
            rows: stored,
            removed,
        })
    }

    pub fn get(&self, id: &str) -> Option<StoredNode> {
        self.read().get(id).cloned()
    }

    /// Direct children of `parent_folder_id` within a transfer; `None` lists
    /// the top level. Folders come first, then case-insensitive by name.
    pub fn children(&self, transfer_id: &str, parent_folder_id: Option<&str>) -> Vec<StoredNode> {
        let mut children: Vec<StoredNode> = self
            .read()
            .values()
            .filter(|n| {
                n.transfer_id == transfer_id && n.parent_folder_id.as_deref() == parent_folder_id
            })
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            b.is_folder
                .cmp(&a.is_folder)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.name.cmp(&b.name))
        });
        children
    }

    /// Every row of a transfer, sorted by path.
    pub fn nodes_for_transfer(&self, transfer_id: &str) -> Vec<StoredNode> {
        let mut nodes: Vec<StoredNode> = self
            .read()
            .values()
            .filter(|n| n.transfer_id == transfer_id)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        nodes
    }

    /// Records where a file was written on this device.
    pub fn set_local_path(&self, id: &str, local_path: &str) -> Result<(), StoreError> {
        let mut map = self.write();
        let node = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let previous = node.local_path.replace(local_path.to_string());
        node.updated_at = Utc::now();

        if let Err(e) = persist(&self.path, &map) {
            if let Some(node) = map.get_mut(id) {
                node.local_path = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes every row of a transfer. Returns the number removed.
    pub fn delete_transfer(&self, transfer_id: &str) -> Result<usize, StoreError> {
        let mut map = self.write();
        let ids: Vec<String> = map
            .values()
            .filter(|n| n.transfer_id == transfer_id)
            .map(|n| n.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let previous: Vec<(String, Option<StoredNode>)> = ids
            .into_iter()
            .map(|id| {
                let old = map.remove(&id);
                (id, old)
            })
            .collect();
        let removed = previous.len();

        if let Err(e) = persist(&self.path, &map) {
            restore(&mut map, previous);
            return Err(e);
        }
        debug!(transfer = %transfer_id, removed, "deleted transfer nodes");
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Outcome of [`NodeStore::replace_transfer`].
#[derive(Debug, Clone)]
pub struct Replaced {
    /// Rows as written, including any `local_path` carried over.
    pub rows: Vec<StoredNode>,
    /// Stale rows of the transfer that were dropped.
    pub removed: usize,
}

/// Undoes map changes recorded as `(id, value before the change)`, newest
/// first, so repeated ids end at their oldest value.
fn restore(map: &mut HashMap<String, StoredNode>, previous: Vec<(String, Option<StoredNode>)>) {
    for (id, old) in previous.into_iter().rev() {
        match old {
            Some(old) => map.insert(id, old),
            None => map.remove(&id),
        };
    }
}

/// Writes all rows to a sibling temp file, then renames it over `path`.
fn persist(path: &Path, nodes: &HashMap<String, StoredNode>) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(nodes)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    debug!("persisted {} node(s) to {:?}", nodes.len(), path);
    Ok(())
}

/// Loads rows from a JSON file on disk.
fn load_nodes(path: &Path) -> Result<HashMap<String, StoredNode>, StoreError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    let nodes: HashMap<String, StoredNode> = serde_json::from_str(&data)?;
    debug!("loaded {} node(s) from {:?}", nodes.len(), path);
    Ok(nodes)
}
