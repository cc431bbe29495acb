//! In-memory tree: an arena of nodes linked by index.
//!
//! Parent and child links are `NodeId` indices into the arena, so a node can
//! point both up and down without shared ownership. Every lookup walks the
//! arena with an explicit stack; tree depth never turns into call depth.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::flat::FlatNode;
use crate::record::TreeRecord;

/// Handle of a node inside one [`FileTree`].
///
/// Only meaningful for the tree that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in arena (creation) order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<R> {
    /// Synthesized folder.
    Folder,
    /// Original input record, unchanged.
    File(R),
}

/// A single folder or file node.
#[derive(Debug, Clone)]
pub struct TreeNode<R> {
    id: String,
    name: String,
    path: String,
    size: u64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind<R>,
}

impl<R> TreeNode<R> {
    /// Folder id, or the record id for files.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path up to and including this node.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Record size for files, recursive sum of descendant files for folders.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind<R> {
        &self.kind
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    /// The wrapped input record, `None` for folders.
    pub fn record(&self) -> Option<&R> {
        match &self.kind {
            NodeKind::File(record) => Some(record),
            NodeKind::Folder => None,
        }
    }
}

/// Folder/file tree produced by one build call.
#[derive(Debug, Clone)]
pub struct FileTree<R> {
    namespace: String,
    nodes: Vec<TreeNode<R>>,
    roots: Vec<NodeId>,
    folder_index: HashMap<String, NodeId>,
}

impl<R> FileTree<R> {
    pub(crate) fn new(namespace: String) -> Self {
        Self {
            namespace,
            nodes: Vec::new(),
            roots: Vec::new(),
            folder_index: HashMap::new(),
        }
    }

    /// Appends a folder under `parent` (or as a root) and indexes it by path.
    pub(crate) fn push_folder(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        path: &str,
        id: String,
    ) -> NodeId {
        let node = self.push(TreeNode {
            id,
            name: name.to_string(),
            path: path.to_string(),
            size: 0,
            parent,
            children: Vec::new(),
            kind: NodeKind::Folder,
        });
        self.folder_index.insert(path.to_string(), node);
        node
    }

    /// Appends a file node wrapping `record` under `parent` (or as a root).
    pub(crate) fn push_file(&mut self, parent: Option<NodeId>, name: &str, record: R) -> NodeId
    where
        R: TreeRecord,
    {
        let node = TreeNode {
            id: record.id().to_string(),
            name: name.to_string(),
            path: record.path().to_string(),
            size: record.size(),
            parent,
            children: Vec::new(),
            kind: NodeKind::File(record),
        };
        self.push(node)
    }

    /// Saturates at `u64::MAX` instead of wrapping.
    pub(crate) fn add_size(&mut self, node: NodeId, size: u64) {
        let total = &mut self.nodes[node.0].size;
        *total = total.saturating_add(size);
    }

    fn push(&mut self, node: TreeNode<R>) -> NodeId {
        let id = NodeId(self.nodes.len());
        match node.parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }

    /// Namespace the tree was built under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Top-level nodes, in insertion order unless re-sorted.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode<R> {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode<R>> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Iterates from the parent of `id` up to its root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, R> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// Looks up a folder by its full path.
    pub fn folder_by_path(&self, path: &str) -> Option<NodeId> {
        self.folder_index.get(path).copied()
    }

    /// Finds a direct child of `parent` (or a root when `None`) by name.
    pub fn find_child_by_name(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        let siblings = match parent {
            Some(parent) => &self.nodes[parent.0].children,
            None => &self.roots,
        };
        siblings
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Depth-first search for a node by folder or record id.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk()
            .map(|(node, _)| node)
            .find(|node| self.nodes[node.0].id == id)
    }

    /// Pre-order traversal yielding each node with its depth (roots are 0).
    pub fn walk(&self) -> Walk<'_, R> {
        Walk {
            tree: self,
            stack: self.roots.iter().rev().map(|&root| (root, 0)).collect(),
        }
    }

    /// Folder nodes in creation order.
    pub fn folders(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(move |id| self.nodes[id.0].is_folder())
    }

    /// File nodes in creation order.
    pub fn files(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(move |id| !self.nodes[id.0].is_folder())
    }

    fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn folder_count(&self) -> usize {
        self.folder_index.len()
    }

    pub fn file_count(&self) -> usize {
        self.nodes.len() - self.folder_index.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of all file sizes in the tree, saturating at `u64::MAX`.
    pub fn total_size(&self) -> u64 {
        self.roots
            .iter()
            .fold(0u64, |acc, root| acc.saturating_add(self.nodes[root.0].size))
    }

    /// Reorders every sibling list (roots included) with `compare`.
    pub fn sort_children<F>(&mut self, mut compare: F)
    where
        F: FnMut(&TreeNode<R>, &TreeNode<R>) -> Ordering,
    {
        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by(|a, b| compare(&self.nodes[a.0], &self.nodes[b.0]));
        self.roots = roots;

        for index in 0..self.nodes.len() {
            if self.nodes[index].children.len() < 2 {
                continue;
            }
            let mut children = std::mem::take(&mut self.nodes[index].children);
            children.sort_by(|a, b| compare(&self.nodes[a.0], &self.nodes[b.0]));
            self.nodes[index].children = children;
        }
    }

    /// Folders before files, then case-insensitive by name.
    pub fn sort_folders_first(&mut self) {
        self.sort_children(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    /// Converts into flat rows carrying `parent_folder_id` back-references.
    ///
    /// Rows keep creation order, so every folder precedes its descendants.
    pub fn into_flat(self) -> Vec<FlatNode<R>> {
        let parent_ids: Vec<Option<String>> = self
            .nodes
            .iter()
            .map(|node| node.parent.map(|parent| self.nodes[parent.0].id.clone()))
            .collect();

        self.nodes
            .into_iter()
            .zip(parent_ids)
            .map(|(node, parent_folder_id)| FlatNode {
                id: node.id,
                parent_folder_id,
                name: node.name,
                path: node.path,
                size: node.size,
                kind: node.kind,
            })
            .collect()
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<'a, R> {
    tree: &'a FileTree<R>,
    next: Option<NodeId>,
}

impl<R> Iterator for Ancestors<'_, R> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes[current.0].parent;
        Some(current)
    }
}

/// Pre-order traversal over a [`FileTree`].
pub struct Walk<'a, R> {
    tree: &'a FileTree<R>,
    stack: Vec<(NodeId, usize)>,
}

impl<R> Iterator for Walk<'_, R> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<(NodeId, usize)> {
        let tree = self.tree;
        let (node, depth) = self.stack.pop()?;
        let children = &tree.nodes[node.0].children;
        self.stack
            .extend(children.iter().rev().map(|&child| (child, depth + 1)));
        Some((node, depth))
    }
}
