//! High-level read operations over an open CherryTree document store.

use crate::core::content::build_node_content;
use crate::{CtbError, Node, NodeContent, NodeStore, Result, Storage};
use std::collections::HashSet;
use std::path::Path;

/// An open `.ctb` document.
///
/// `CtbDocument` is the primary interface for reading nodes. Every call is an
/// independent query; nothing is cached between calls.
pub struct CtbDocument<S: NodeStore = Storage> {
    store: S,
}

impl CtbDocument<Storage> {
    /// Opens the document store at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CtbError::InvalidDocument`] if the file lacks the CherryTree
    /// tables, or [`CtbError::Database`] for any SQLite failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let store = Storage::open(path)?;
        log::debug!("opened document store {}", path.display());
        Ok(Self { store })
    }
}

impl<S: NodeStore> CtbDocument<S> {
    /// Wraps any [`NodeStore`].
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// Number of nodes in the document; an absent table row counts as zero.
    ///
    /// # Errors
    ///
    /// Returns [`CtbError::Database`] for query failures other than "not found".
    pub fn total_nodes_count(&self) -> Result<i64> {
        match self.store.node_count() {
            Ok(count) => Ok(count),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Fetches the metadata of node `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CtbError::NotFound`] if no node with `id` exists.
    pub fn get_node(&self, id: i64) -> Result<Node> {
        let meta = self.store.node_meta(id)?;
        let has_children = !self.store.child_rows(id)?.is_empty();
        Ok(Node::from_row(meta, has_children))
    }

    /// Returns the direct children of `id`, ordered by sequence.
    ///
    /// `id` 0 lists the top-level nodes.
    ///
    /// # Errors
    ///
    /// Returns [`CtbError::NotFound`] if a listed child has no `node` row.
    pub fn get_sub_nodes(&self, id: i64) -> Result<Vec<Node>> {
        self.store
            .child_rows(id)?
            .into_iter()
            .map(|child| self.get_node(child.node_id))
            .collect()
    }

    /// Returns the top-level ancestor of `id` (the node itself if top-level).
    ///
    /// # Errors
    ///
    /// Returns [`CtbError::NotFound`] if `id` or an ancestor has no
    /// `children` row, or [`CtbError::Decode`] if the parent links loop.
    pub fn find_root_node(&self, id: i64) -> Result<Node> {
        let mut child = self.store.child_row(id)?;
        let mut seen = HashSet::from([child.node_id]);
        while child.father_id != 0 {
            child = self.store.child_row(child.father_id)?;
            if !seen.insert(child.node_id) {
                return Err(CtbError::Decode(format!(
                    "parent links of node {id} form a cycle at node {}",
                    child.node_id
                )));
            }
        }
        self.get_node(child.node_id)
    }

    /// Reads and rebuilds the content of node `id`.
    ///
    /// With `dest`, embedded images and files are written into that directory
    /// and referenced by path; otherwise their bytes are inlined.
    ///
    /// # Errors
    ///
    /// See [`build_node_content`].
    pub fn get_node_content(&self, id: i64, dest: Option<&Path>) -> Result<NodeContent> {
        build_node_content(&self.store, id, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::fixture::Fixture;

    fn sample() -> Fixture {
        let fx = Fixture::new();
        fx.add_node(1, 0, 1, "Projects", 1, "custom-colors", "<node/>");
        fx.add_node(2, 0, 2, "Journal", 0, "plain-text", "");
        fx.add_node(10, 1, 2, "Beta", 1, "custom-colors", "<node/>");
        fx.add_node(11, 1, 1, "Alpha", 1, "custom-colors", "<node/>");
        fx.add_node(20, 11, 1, "Deep", 0, "sh", "echo");
        fx
    }

    #[test]
    fn test_open_and_count() {
        let fx = sample();
        let doc = CtbDocument::open(fx.path()).unwrap();
        assert_eq!(doc.total_nodes_count().unwrap(), 5);
    }

    #[test]
    fn test_open_rejects_non_ctb_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "hello").unwrap();
        assert!(CtbDocument::open(temp.path()).is_err());
    }

    #[test]
    fn test_get_node_reports_children() {
        let fx = sample();
        let doc = CtbDocument::with_store(fx.storage());
        let node = doc.get_node(1).unwrap();
        assert_eq!(node.name, "Projects");
        assert!(node.has_children);
        assert!(node.is_rich_text());
        assert!(!doc.get_node(2).unwrap().has_children);
    }

    #[test]
    fn test_get_node_missing() {
        let fx = sample();
        let doc = CtbDocument::with_store(fx.storage());
        assert!(doc.get_node(999).unwrap_err().is_not_found());
    }

    #[test]
    fn test_sub_nodes_in_sequence_order() {
        let fx = sample();
        let doc = CtbDocument::with_store(fx.storage());
        let names: Vec<String> = doc.get_sub_nodes(1).unwrap().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["Alpha".to_string(), "Beta".to_string()]);

        let top: Vec<i64> = doc.get_sub_nodes(0).unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(top, vec![1, 2]);

        assert!(doc.get_sub_nodes(20).unwrap().is_empty());
    }

    #[test]
    fn test_find_root_node_walks_up() {
        let fx = sample();
        let doc = CtbDocument::with_store(fx.storage());
        assert_eq!(doc.find_root_node(20).unwrap().id, 1);
        assert_eq!(doc.find_root_node(2).unwrap().id, 2);
    }

    #[test]
    fn test_find_root_node_detects_cycle() {
        let fx = Fixture::new();
        fx.add_node(1, 2, 1, "a", 0, "plain-text", "");
        fx.add_node(2, 1, 1, "b", 0, "plain-text", "");
        let doc = CtbDocument::with_store(fx.storage());
        assert!(matches!(doc.find_root_node(1), Err(CtbError::Decode(_))));
    }

    #[test]
    fn test_get_node_content_plain() {
        let fx = sample();
        let doc = CtbDocument::with_store(fx.storage());
        let content = doc.get_node_content(20, None).unwrap();
        assert!(!content.is_rich_text);
        assert_eq!(content.id, 20);
    }

    #[test]
    fn test_get_node_content_rich_empty_node() {
        let fx = sample();
        let doc = CtbDocument::with_store(fx.storage());
        let content = doc.get_node_content(1, None).unwrap();
        let tree = content.document().unwrap();
        assert_eq!(tree.lines.len(), 1);
        assert!(tree.lines[0].is_empty());
    }
}
