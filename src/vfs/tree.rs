//! Tree construction and editing.
//!
//! - `build_file_tree` turns a flat generated file list into a nested tree
//! - `update_content` applies an editor change by node id
//! - `find_by_path` / `find_by_id` look nodes up
//! - `fingerprint` hashes the whole tree for change detection

use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use super::node::{extension, join};
use super::{ChangeMarker, FileNode, NodeKind, Project, VfsError};

/// One file produced by the generator, addressed by its full path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Flat project description as returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub files: Vec<GeneratedFile>,
}

impl GeneratedProject {
    /// Build a project whose every node is marked as added.
    pub fn into_project(self, last_saved: u64) -> Result<Project, VfsError> {
        let structure = build_file_tree(&self.files)?;
        Ok(Project {
            id: node_id(&self.name),
            name: self.name,
            description: self.description,
            structure,
            last_saved,
        })
    }
}

/// Stable node id derived from a path.
pub fn node_id(path: &str) -> String {
    hex::encode(&blake3::hash(path.as_bytes()).as_bytes()[..8])
}

/// Build a nested tree from flat paths.
///
/// Folders are created on demand and opened. Every node is marked
/// `Added`, and files without a language hint get their extension.
pub fn build_file_tree(files: &[GeneratedFile]) -> Result<Vec<FileNode>, VfsError> {
    let mut root = Vec::new();

    for file in files {
        let segments = path_segments(&file.path)?;
        let Some((name, dirs)) = segments.split_last() else {
            return Err(VfsError::InvalidPath(file.path.clone()));
        };

        let mut level = &mut root;
        let mut parent = String::new();
        for dir in dirs {
            parent = join(&parent, dir);
            level = folder_children(level, dir, &parent)?;
        }

        let path = join(&parent, name);
        if level.iter().any(|n| n.name == *name) {
            return Err(VfsError::DuplicatePath(path));
        }

        let language = file
            .language
            .clone()
            .or_else(|| extension(name).map(str::to_string));
        level.push(FileNode {
            id: node_id(&path),
            name: (*name).to_string(),
            kind: NodeKind::File {
                content: Some(file.content.clone()),
                language,
            },
            change: Some(ChangeMarker::Added),
        });
    }

    Ok(root)
}

/// Segments of a generated path. Empty and `.` segments are dropped;
/// `..` cannot be placed in a tree rooted at the project.
fn path_segments(path: &str) -> Result<Vec<&str>, VfsError> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(VfsError::InvalidPath(path.to_string())),
            name => segments.push(name),
        }
    }
    Ok(segments)
}

/// Find or create the folder `name` in `level`, returning its children.
fn folder_children<'t>(
    level: &'t mut Vec<FileNode>,
    name: &str,
    path: &str,
) -> Result<&'t mut Vec<FileNode>, VfsError> {
    let pos = match level.iter().position(|n| n.name == name) {
        Some(pos) => pos,
        None => {
            level.push(FileNode {
                id: node_id(path),
                name: name.to_string(),
                kind: NodeKind::Folder {
                    children: Vec::new(),
                    is_open: true,
                },
                change: Some(ChangeMarker::Added),
            });
            level.len() - 1
        }
    };
    level[pos]
        .children_mut()
        .ok_or_else(|| VfsError::NotAFolder(path.to_string()))
}

/// Replace the content of the file with `id`.
///
/// The marker becomes `Modified` unless the file is still `Added`.
/// Returns `false` when no file has that id.
pub fn update_content(nodes: &mut [FileNode], id: &str, new_content: &str) -> bool {
    for node in nodes {
        if node.id == id {
            let NodeKind::File { content, .. } = &mut node.kind else {
                return false;
            };
            *content = Some(new_content.to_string());
            if node.change != Some(ChangeMarker::Added) {
                node.change = Some(ChangeMarker::Modified);
            }
            return true;
        }
        if let Some(children) = node.children_mut()
            && update_content(children, id, new_content)
        {
            return true;
        }
    }
    false
}

/// Find a node by its slash-joined path.
pub fn find_by_path<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
    let mut level = nodes;
    let mut found = None;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let node = level.iter().find(|n| n.name == segment)?;
        level = node.children();
        found = Some(node);
    }
    found
}

/// Find a node by id, returning it with its path.
pub fn find_by_id<'a>(nodes: &'a [FileNode], id: &str) -> Option<(String, &'a FileNode)> {
    fn walk<'a>(nodes: &'a [FileNode], id: &str, parent: &str) -> Option<(String, &'a FileNode)> {
        for node in nodes {
            let path = join(parent, &node.name);
            if node.id == id {
                return Some((path, node));
            }
            if let Some(hit) = walk(node.children(), id, &path) {
                return Some(hit);
            }
        }
        None
    }
    walk(nodes, id, "")
}

/// Hash of every path and content in the tree.
///
/// Markers and ids are ignored: two trees with the same files fingerprint
/// the same.
pub fn fingerprint(nodes: &[FileNode]) -> u64 {
    fn feed(nodes: &[FileNode], parent: &str, hasher: &mut FxHasher) {
        for node in nodes {
            let path = join(parent, &node.name);
            hasher.write(path.as_bytes());
            hasher.write_u8(0);
            if let Some(content) = node.content() {
                hasher.write(content.as_bytes());
            }
            hasher.write_u8(0);
            feed(node.children(), &path, hasher);
        }
    }
    let mut hasher = FxHasher::default();
    feed(nodes, "", &mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(paths: &[&str]) -> Vec<GeneratedFile> {
        paths
            .iter()
            .map(|p| GeneratedFile {
                path: p.to_string(),
                content: format!("// {p}"),
                language: None,
            })
            .collect()
    }

    #[test]
    fn test_build_file_tree_nests_folders() {
        let tree = build_file_tree(&generated(&[
            "index.tsx",
            "src/App.tsx",
            "src/components/Button.tsx",
        ]))
        .unwrap();

        assert_eq!(tree.len(), 2);
        let src = find_by_path(&tree, "src").unwrap();
        assert!(src.is_folder());
        assert_eq!(src.children().len(), 2);
        let button = find_by_path(&tree, "src/components/Button.tsx").unwrap();
        assert_eq!(button.content(), Some("// src/components/Button.tsx"));
        assert_eq!(button.language(), Some("tsx"));
    }

    #[test]
    fn test_build_file_tree_marks_everything_added() {
        let tree = build_file_tree(&generated(&["src/App.tsx"])).unwrap();
        assert_eq!(tree[0].change, Some(ChangeMarker::Added));
        assert_eq!(tree[0].children()[0].change, Some(ChangeMarker::Added));
        assert!(matches!(tree[0].kind, NodeKind::Folder { is_open: true, .. }));
    }

    #[test]
    fn test_build_file_tree_keeps_language_hint() {
        let files = vec![GeneratedFile {
            path: "main.ts".into(),
            content: String::new(),
            language: Some("typescript".into()),
        }];
        let tree = build_file_tree(&files).unwrap();
        assert_eq!(tree[0].language(), Some("typescript"));
    }

    #[test]
    fn test_build_file_tree_rejects_duplicates() {
        let result = build_file_tree(&generated(&["src/a.ts", "./src/a.ts"]));
        assert!(matches!(result, Err(VfsError::DuplicatePath(p)) if p == "src/a.ts"));
    }

    #[test]
    fn test_build_file_tree_normalises_dot_segments() {
        let tree = build_file_tree(&generated(&["./src/./App.tsx", "src//util.ts"])).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "src");
        assert!(find_by_path(&tree, "src/App.tsx").is_some());
        assert!(find_by_path(&tree, "src/util.ts").is_some());
    }

    #[test]
    fn test_build_file_tree_rejects_parent_segments() {
        for path in ["../secret.ts", "src/../../x.ts", "a/.."] {
            let result = build_file_tree(&generated(&[path]));
            assert_eq!(result, Err(VfsError::InvalidPath(path.to_string())));
        }
        let result = build_file_tree(&generated(&["./"]));
        assert!(matches!(result, Err(VfsError::InvalidPath(_))));
    }

    #[test]
    fn test_build_file_tree_rejects_file_as_folder() {
        let result = build_file_tree(&generated(&["src", "src/a.ts"]));
        assert!(matches!(result, Err(VfsError::NotAFolder(p)) if p == "src"));
    }

    #[test]
    fn test_update_content_marks_modified() {
        let mut tree = vec![FileNode::folder(
            "d",
            "src",
            vec![FileNode::file("f", "a.ts", "old")],
        )];
        assert!(update_content(&mut tree, "f", "new"));
        let node = find_by_path(&tree, "src/a.ts").unwrap();
        assert_eq!(node.content(), Some("new"));
        assert_eq!(node.change, Some(ChangeMarker::Modified));
    }

    #[test]
    fn test_update_content_keeps_added() {
        let mut tree = build_file_tree(&generated(&["a.ts"])).unwrap();
        let id = tree[0].id.clone();
        assert!(update_content(&mut tree, &id, "edited"));
        assert_eq!(tree[0].change, Some(ChangeMarker::Added));
    }

    #[test]
    fn test_update_content_unknown_id() {
        let mut tree = vec![FileNode::file("f", "a.ts", "old")];
        assert!(!update_content(&mut tree, "nope", "new"));
        assert_eq!(tree[0].content(), Some("old"));
    }

    #[test]
    fn test_find_by_id_returns_path() {
        let tree = build_file_tree(&generated(&["src/App.tsx"])).unwrap();
        let id = node_id("src/App.tsx");
        let (path, node) = find_by_id(&tree, &id).unwrap();
        assert_eq!(path, "src/App.tsx");
        assert_eq!(node.name, "App.tsx");
    }

    #[test]
    fn test_fingerprint_ignores_markers() {
        let a = vec![FileNode::file("1", "a.ts", "x")];
        let b = vec![FileNode::file("2", "a.ts", "x").with_change(ChangeMarker::Modified)];
        let c = vec![FileNode::file("1", "a.ts", "y")];
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_into_project() {
        let project = GeneratedProject {
            name: "demo".into(),
            description: "a demo".into(),
            files: generated(&["index.tsx"]),
        }
        .into_project(42)
        .unwrap();
        assert_eq!(project.name, "demo");
        assert_eq!(project.last_saved, 42);
        assert_eq!(project.structure.len(), 1);
    }
}
