//! Input contract for the tree builder.

/// A flat, path-bearing record that can be placed into a tree.
///
/// The builder only reads `id`, `path` and `size`; everything else on the
/// implementing type is carried through untouched inside the file node.
pub trait TreeRecord {
    /// Caller-supplied identity, reused as the file node id.
    fn id(&self) -> &str;

    /// Relative `/`-separated path without a leading slash.
    fn path(&self) -> &str;

    /// Size in bytes.
    fn size(&self) -> u64;
}

impl<T: TreeRecord + ?Sized> TreeRecord for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn path(&self) -> &str {
        (**self).path()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}
