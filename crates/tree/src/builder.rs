//! Flat record list to folder/file tree.

use tracing::debug;

use crate::flat::FlatNode;
use crate::id::FolderIdPolicy;
use crate::record::TreeRecord;
use crate::tree::{FileTree, NodeId};

/// Builds trees for one namespace (typically a transfer id).
///
/// The builder holds configuration only; every call starts from an empty
/// tree, so separate calls never observe each other's folders or sizes.
#[derive(Debug, Clone)]
pub struct PathTreeBuilder {
    namespace: String,
    policy: FolderIdPolicy,
}

impl PathTreeBuilder {
    /// Creates a builder using [`FolderIdPolicy::Derived`].
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            policy: FolderIdPolicy::default(),
        }
    }

    pub fn with_id_policy(mut self, policy: FolderIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id_policy(&self) -> FolderIdPolicy {
        self.policy
    }

    /// Builds the in-memory tree.
    ///
    /// Records are processed in input order. A record whose path has no `/`
    /// becomes a root node; otherwise every ancestor folder is looked up or
    /// created along the way and credited with the record's size.
    pub fn build_tree<R, I>(&self, records: I) -> FileTree<R>
    where
        R: TreeRecord,
        I: IntoIterator<Item = R>,
    {
        let mut tree = FileTree::new(self.namespace.clone());
        for record in records {
            self.insert(&mut tree, record);
        }
        debug!(
            namespace = %self.namespace,
            files = tree.file_count(),
            folders = tree.folder_count(),
            total_size = tree.total_size(),
            "built file tree"
        );
        tree
    }

    /// Builds the flat variant: rows with `parent_folder_id`, parents first.
    pub fn build_flat<R, I>(&self, records: I) -> Vec<FlatNode<R>>
    where
        R: TreeRecord,
        I: IntoIterator<Item = R>,
    {
        self.build_tree(records).into_flat()
    }

    fn insert<R: TreeRecord>(&self, tree: &mut FileTree<R>, record: R) {
        let path = record.path().to_string();
        let size = record.size();

        let Some(split) = path.rfind('/') else {
            tree.push_file(None, &path, record);
            return;
        };

        let dirs = &path[..split];
        let mut parent: Option<NodeId> = None;
        let mut start = 0;
        for segment in dirs.split('/') {
            let end = start + segment.len();
            let prefix = &dirs[..end];
            let folder = match tree.folder_by_path(prefix) {
                Some(existing) => existing,
                None => {
                    let id = self.policy.folder_id(&self.namespace, prefix);
                    tree.push_folder(parent, segment, prefix, id)
                }
            };
            tree.add_size(folder, size);
            parent = Some(folder);
            start = end + 1;
        }

        tree.push_file(parent, &path[split + 1..], record);
    }
}

/// Builds an in-memory tree with derived folder ids.
pub fn build_tree<R, I>(namespace: &str, records: I) -> FileTree<R>
where
    R: TreeRecord,
    I: IntoIterator<Item = R>,
{
    PathTreeBuilder::new(namespace).build_tree(records)
}

/// Builds flat rows with derived folder ids.
pub fn build_flat<R, I>(namespace: &str, records: I) -> Vec<FlatNode<R>>
where
    R: TreeRecord,
    I: IntoIterator<Item = R>,
{
    PathTreeBuilder::new(namespace).build_flat(records)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::testutil::{Rec, rec};

    /// Shape of a tree independent of ids and sibling order:
    /// path -> (is_folder, size, parent path).
    fn shape<R>(tree: &FileTree<R>) -> BTreeMap<String, (bool, u64, Option<String>)> {
        tree.walk()
            .map(|(id, _)| {
                let node = tree.node(id);
                let parent = node.parent().map(|p| tree.node(p).path().to_string());
                (
                    node.path().to_string(),
                    (node.is_folder(), node.size(), parent),
                )
            })
            .collect()
    }

    fn folder_size<R>(tree: &FileTree<R>, path: &str) -> u64 {
        tree.node(tree.folder_by_path(path).unwrap()).size()
    }

    #[test]
    fn accumulates_folder_sizes() {
        let tree = build_tree(
            "t1",
            vec![
                rec("docs/report.pdf", 500),
                rec("docs/notes.txt", 300),
                rec("docs/subfolder/image.png", 200),
            ],
        );

        assert_eq!(folder_size(&tree, "docs"), 1000);
        assert_eq!(folder_size(&tree, "docs/subfolder"), 200);
        assert_eq!(tree.folder_count(), 2);
        assert_eq!(tree.file_count(), 3);
    }

    #[test]
    fn folder_size_matches_prefix_sum() {
        let records = vec![
            rec("a/x.bin", 7),
            rec("a/b/y.bin", 11),
            rec("a/b/c/z.bin", 13),
            rec("ab/w.bin", 17),
            rec("a/b2/v.bin", 19),
            rec("top.bin", 23),
        ];
        let tree = build_tree("t", records.clone());

        for folder in tree.folders() {
            let node = tree.node(folder);
            let prefix = format!("{}/", node.path());
            let expected: u64 = records
                .iter()
                .filter(|r| r.path.starts_with(&prefix))
                .map(|r| r.size)
                .sum();
            assert_eq!(node.size(), expected, "size of {}", node.path());
        }
        // "ab" must not be credited to "a".
        assert_eq!(folder_size(&tree, "a"), 7 + 11 + 13 + 19);
        assert_eq!(folder_size(&tree, "ab"), 17);
    }

    #[test]
    fn one_folder_per_distinct_prefix() {
        let records = vec![
            rec("a/b/one.txt", 1),
            rec("a/b/two.txt", 1),
            rec("a/c/three.txt", 1),
            rec("a/four.txt", 1),
            rec("d/e/f/five.txt", 1),
            rec("root.txt", 1),
        ];

        let mut prefixes = BTreeSet::new();
        for r in &records {
            if let Some(split) = r.path.rfind('/') {
                let dirs = &r.path[..split];
                for (idx, _) in dirs.match_indices('/') {
                    prefixes.insert(dirs[..idx].to_string());
                }
                prefixes.insert(dirs.to_string());
            }
        }

        let tree = build_tree("t", records);
        let folders: BTreeSet<String> = tree
            .folders()
            .map(|id| tree.node(id).path().to_string())
            .collect();

        assert_eq!(folders, prefixes);
        assert_eq!(tree.folder_count(), prefixes.len());
    }

    #[test]
    fn input_order_does_not_change_shape() {
        let records = vec![
            rec("music/rock/a.mp3", 300),
            rec("music/jazz/b.mp3", 200),
            rec("cover.jpg", 50),
            rec("music/rock/live/c.mp3", 400),
            rec("music/d.mp3", 100),
            rec("video/e.mp4", 1000),
        ];

        let forward = build_tree("t", records.clone());

        let mut reversed = records.clone();
        reversed.reverse();
        let backward = build_tree("t", reversed);

        let mut rotated = records.clone();
        rotated.rotate_left(3);
        let rotated = build_tree("t", rotated);

        let mut interleaved = records.clone();
        interleaved.swap(0, 5);
        interleaved.swap(1, 3);
        let interleaved = build_tree("t", interleaved);

        assert_eq!(shape(&forward), shape(&backward));
        assert_eq!(shape(&forward), shape(&rotated));
        assert_eq!(shape(&forward), shape(&interleaved));

        // Derived ids depend only on namespace and path.
        let rock = forward.folder_by_path("music/rock").unwrap();
        let rock_back = backward.folder_by_path("music/rock").unwrap();
        assert_eq!(forward.node(rock).id(), backward.node(rock_back).id());
    }

    #[test]
    fn parent_chain_for_nested_file() {
        let rows = build_flat("t1", vec![rec("a/b/c/file.txt", 100)]);
        assert_eq!(rows.len(), 4);

        let by_path: BTreeMap<&str, &FlatNode<Rec>> =
            rows.iter().map(|row| (row.path.as_str(), row)).collect();
        let folder_a = by_path["a"];
        let folder_b = by_path["a/b"];
        let folder_c = by_path["a/b/c"];
        let file = by_path["a/b/c/file.txt"];

        for folder in [folder_a, folder_b, folder_c] {
            assert!(folder.is_folder());
            assert_eq!(folder.size, 100);
        }
        assert_eq!(folder_a.name, "a");
        assert_eq!(folder_b.name, "b");
        assert_eq!(folder_c.name, "c");

        assert_eq!(folder_a.parent_folder_id, None);
        assert_eq!(folder_b.parent_folder_id.as_deref(), Some(folder_a.id.as_str()));
        assert_eq!(folder_c.parent_folder_id.as_deref(), Some(folder_b.id.as_str()));
        assert_eq!(file.parent_folder_id.as_deref(), Some(folder_c.id.as_str()));

        assert!(!file.is_folder());
        assert_eq!(file.id, "file:a/b/c/file.txt");
        assert_eq!(file.name, "file.txt");
        assert_eq!(file.record(), Some(&rec("a/b/c/file.txt", 100)));
    }

    #[test]
    fn parent_chain_in_memory() {
        let tree = build_tree("t1", vec![rec("a/b/c/file.txt", 100)]);
        let file = tree.find_by_id("file:a/b/c/file.txt").unwrap();

        let chain: Vec<&str> = tree.ancestors(file).map(|id| tree.node(id).path()).collect();
        assert_eq!(chain, vec!["a/b/c", "a/b", "a"]);

        let root = tree.folder_by_path("a").unwrap();
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.roots(), &[root]);
    }

    #[test]
    fn root_level_records_skip_folder_synthesis() {
        let tree = build_tree("t", vec![rec("", 5), rec("plain.txt", 7)]);

        assert_eq!(tree.folder_count(), 0);
        assert_eq!(tree.roots().len(), 2);
        for &root in tree.roots() {
            assert_eq!(tree.parent(root), None);
            assert!(!tree.node(root).is_folder());
        }

        let empty = tree.node(tree.roots()[0]);
        assert_eq!(empty.name(), "");
        assert_eq!(empty.size(), 5);
        assert_eq!(tree.node(tree.roots()[1]).name(), "plain.txt");
    }

    #[test]
    fn deep_nesting_25_levels() {
        let dirs: Vec<String> = (1..=25).map(|i| format!("level{i}")).collect();
        let path = format!("{}/leaf.dat", dirs.join("/"));
        let rows = build_flat("t", vec![rec(&path, 42)]);

        assert_eq!(rows.len(), 26);
        let folders: Vec<&FlatNode<Rec>> = rows.iter().filter(|r| r.is_folder()).collect();
        assert_eq!(folders.len(), 25);

        assert_eq!(folders[0].parent_folder_id, None);
        for pair in folders.windows(2) {
            assert_eq!(pair[1].parent_folder_id.as_deref(), Some(pair[0].id.as_str()));
            assert_eq!(pair[1].size, 42);
        }

        let leaf = &rows[25];
        assert!(!leaf.is_folder());
        assert_eq!(leaf.name, "leaf.dat");
        assert_eq!(leaf.parent_folder_id.as_deref(), Some(folders[24].id.as_str()));
        assert_eq!(folders[24].path, dirs.join("/"));
    }

    #[test]
    fn very_deep_paths_do_not_recurse() {
        let depth = 2_000;
        let path = format!("{}file", "d/".repeat(depth));
        let tree = build_tree("t", vec![rec(&path, 1)]);

        assert_eq!(tree.folder_count(), depth);
        let file = tree.files().next().unwrap();
        assert_eq!(tree.ancestors(file).count(), depth);
        assert_eq!(tree.walk().last().map(|(_, d)| d), Some(depth));
        assert_eq!(tree.find_by_id(&format!("file:{path}")), Some(file));
    }

    #[test]
    fn separate_namespaces_are_isolated() {
        let builder_a = PathTreeBuilder::new("A");
        let builder_b = PathTreeBuilder::new("B");

        let tree_a = builder_a.build_tree(vec![rec("docs/a.txt", 10)]);
        let tree_b = builder_b.build_tree(vec![rec("docs/b.txt", 99), rec("docs/c.txt", 1)]);

        let docs_a = tree_a.node(tree_a.folder_by_path("docs").unwrap());
        let docs_b = tree_b.node(tree_b.folder_by_path("docs").unwrap());

        assert_ne!(docs_a.id(), docs_b.id());
        assert!(docs_a.id().starts_with("A:"));
        assert!(docs_b.id().starts_with("B:"));
        assert_eq!(docs_a.size(), 10);
        assert_eq!(docs_b.size(), 100);

        // Building again on the same builder starts from scratch.
        let again = builder_a.build_tree(vec![rec("docs/a.txt", 10)]);
        assert_eq!(again.node(again.folder_by_path("docs").unwrap()).size(), 10);
    }

    #[test]
    fn derived_ids_stable_across_calls() {
        let records = vec![rec("x/y/z.txt", 3)];
        let first = build_flat("t", records.clone());
        let second = build_flat("t", records);
        let ids = |rows: &[FlatNode<Rec>]| rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn random_ids_stable_within_call_only() {
        let builder = PathTreeBuilder::new("t").with_id_policy(FolderIdPolicy::Random);
        let records = vec![rec("x/one.txt", 1), rec("x/two.txt", 2)];

        let first = builder.build_tree(records.clone());
        let x = first.folder_by_path("x").unwrap();
        for file in first.files() {
            assert_eq!(first.parent(file), Some(x));
        }
        assert_eq!(first.folder_count(), 1);

        let second = builder.build_tree(records);
        let x2 = second.folder_by_path("x").unwrap();
        assert_ne!(first.node(x).id(), second.node(x2).id());
        assert_eq!(first.node(x).size(), second.node(x2).size());
    }

    #[test]
    fn builds_from_borrowed_records() {
        let records = vec![rec("a/one.txt", 4), rec("a/two.txt", 6)];
        let tree = build_tree("t", &records);
        let a = tree.folder_by_path("a").unwrap();
        assert_eq!(tree.node(a).size(), 10);

        let file = tree.files().next().unwrap();
        assert_eq!(tree.node(file).record().map(|r| r.size), Some(4));
        // Input list is still usable.
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn shared_prefix_reuses_folder() {
        let tree = build_tree(
            "t",
            vec![rec("a/b/one.txt", 1), rec("a/c/two.txt", 2), rec("a/b/three.txt", 4)],
        );
        let a = tree.folder_by_path("a").unwrap();
        let b = tree.folder_by_path("a/b").unwrap();
        assert_eq!(tree.children(a).len(), 2);
        assert_eq!(tree.children(b).len(), 2);
        assert_eq!(tree.node(a).size(), 7);
        assert_eq!(tree.node(b).size(), 5);
    }

    #[test]
    fn trees_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileTree<Rec>>();
        assert_send_sync::<FlatNode<Rec>>();
        assert_send_sync::<PathTreeBuilder>();
    }

    #[test]
    fn concurrent_builds_stay_isolated() {
        let records: Vec<Rec> = (0..300)
            .map(|i| rec(&format!("d{}/s{}/f{i}.bin", i % 5, i % 3), 1 + i as u64))
            .collect();
        let expected = shape(&build_tree("solo", &records));

        let (left, right) = std::thread::scope(|scope| {
            let left = scope.spawn(|| build_tree("left", &records));
            let right = scope.spawn(|| build_flat("right", records.iter().rev()));
            (left.join().unwrap(), right.join().unwrap())
        });

        assert_eq!(shape(&left), expected);
        assert_eq!(left.namespace(), "left");
        assert_eq!(right.len(), left.len());
        for row in right.iter().filter(|row| row.is_folder()) {
            assert!(row.id.starts_with("right:"), "{}", row.id);
            let in_left = left.folder_by_path(&row.path).unwrap();
            assert_eq!(left.node(in_left).size(), row.size);
            assert_ne!(left.node(in_left).id(), row.id);
        }
    }
}
