//! Flat path lookup over a file tree.

use std::collections::BTreeMap;

use super::node::join;
use super::{FileNode, VfsError};

/// Path-to-file index over a borrowed tree.
///
/// Keys are `/`-joined names from the root with no leading slash.
/// Only files are indexed; folders are traversed.
#[derive(Debug, Default)]
pub struct FileIndex<'a> {
    files: BTreeMap<String, &'a FileNode>,
}

impl<'a> FileIndex<'a> {
    /// Index a tree rooted at the project root.
    pub fn build(nodes: &'a [FileNode]) -> Result<Self, VfsError> {
        Self::build_with_base(nodes, "")
    }

    /// Index a tree whose nodes live under `base`.
    pub fn build_with_base(nodes: &'a [FileNode], base: &str) -> Result<Self, VfsError> {
        let mut index = Self::default();
        index.insert_all(nodes, base.trim_matches('/'))?;
        Ok(index)
    }

    fn insert_all(&mut self, nodes: &'a [FileNode], parent: &str) -> Result<(), VfsError> {
        for node in nodes {
            let path = join(parent, &node.name);
            if node.is_folder() {
                self.insert_all(node.children(), &path)?;
                continue;
            }
            if self.files.contains_key(&path) {
                return Err(VfsError::DuplicatePath(path));
            }
            self.files.insert(path, node);
        }
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&'a FileNode> {
        self.files.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Content of the file at `path` (missing content reads as empty).
    pub fn content(&self, path: &str) -> Option<&'a str> {
        self.get(path).map(|node| node.content().unwrap_or_default())
    }

    /// Indexed paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
