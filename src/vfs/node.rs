//! File tree node types.

use serde::{Deserialize, Serialize};

use super::VfsError;

/// Change marker shown next to a node in the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeMarker {
    /// Created in this session (generated or new file).
    #[serde(rename = "A")]
    Added,
    /// Edited after it was created.
    #[serde(rename = "M")]
    Modified,
}

/// File or folder payload.
///
/// Files carry content, folders carry children. The split makes a folder
/// with content (or a file with children) unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Language hint; the extension is used when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Folder {
        #[serde(default)]
        children: Vec<FileNode>,
        #[serde(default, rename = "isOpen")]
        is_open: bool,
    },
}

/// One node of the virtual project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    /// Single path segment, never contains `/`.
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(
        default,
        rename = "gitStatus",
        skip_serializing_if = "Option::is_none"
    )]
    pub change: Option<ChangeMarker>,
}

impl FileNode {
    /// Create a file node.
    pub fn file(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::File {
                content: Some(content.into()),
                language: None,
            },
            change: None,
        }
    }

    /// Create a folder node.
    pub fn folder(id: impl Into<String>, name: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder {
                children,
                is_open: false,
            },
            change: None,
        }
    }

    pub fn with_language(mut self, hint: impl Into<String>) -> Self {
        if let NodeKind::File { language, .. } = &mut self.kind {
            *language = Some(hint.into());
        }
        self
    }

    pub fn with_change(mut self, marker: ChangeMarker) -> Self {
        self.change = Some(marker);
        self
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    /// File content, `None` for folders and files without content.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content, .. } => content.as_deref(),
            NodeKind::Folder { .. } => None,
        }
    }

    /// Child nodes (empty for files).
    pub fn children(&self) -> &[FileNode] {
        match &self.kind {
            NodeKind::Folder { children, .. } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<FileNode>> {
        match &mut self.kind {
            NodeKind::Folder { children, .. } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    /// Language hint, falling back to the extension of the name.
    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File {
                language: Some(hint),
                ..
            } => Some(hint),
            NodeKind::File { language: None, .. } => extension(&self.name),
            NodeKind::Folder { .. } => None,
        }
    }

    /// Check structural rules for a whole tree.
    ///
    /// Names must be non-empty, free of `/`, and unique among siblings.
    pub fn validate_tree(nodes: &[FileNode]) -> Result<(), VfsError> {
        validate_level(nodes, "")
    }
}

fn validate_level(nodes: &[FileNode], parent: &str) -> Result<(), VfsError> {
    let mut seen = rustc_hash::FxHashSet::default();
    for node in nodes {
        if node.name.is_empty() || node.name.contains('/') {
            return Err(VfsError::InvalidName(node.name.clone()));
        }
        let path = join(parent, &node.name);
        if !seen.insert(node.name.as_str()) {
            return Err(VfsError::DuplicatePath(path));
        }
        validate_level(node.children(), &path)?;
    }
    Ok(())
}

/// Join a parent path and a segment with `/`.
pub(crate) fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Extension of a file name, without the dot.
pub(crate) fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_falls_back_to_extension() {
        let node = FileNode::file("1", "App.tsx", "");
        assert_eq!(node.language(), Some("tsx"));

        let node = FileNode::file("2", "App.tsx", "").with_language("typescript");
        assert_eq!(node.language(), Some("typescript"));

        let node = FileNode::file("3", ".env", "");
        assert_eq!(node.language(), None);
    }

    #[test]
    fn test_serde_shape() {
        let node = FileNode::folder(
            "f",
            "src",
            vec![FileNode::file("a", "App.tsx", "x").with_change(ChangeMarker::Added)],
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["isOpen"], false);
        assert_eq!(json["children"][0]["type"], "file");
        assert_eq!(json["children"][0]["content"], "x");
        assert_eq!(json["children"][0]["gitStatus"], "A");

        let back: FileNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_file_without_content_parses() {
        let node: FileNode =
            serde_json::from_str(r#"{"id":"1","name":"a.ts","type":"file"}"#).unwrap();
        assert!(node.is_file());
        assert_eq!(node.content(), None);
    }

    #[test]
    fn test_validate_rejects_duplicate_siblings() {
        let tree = vec![
            FileNode::file("1", "a.ts", ""),
            FileNode::folder(
                "2",
                "src",
                vec![FileNode::file("3", "b.ts", ""), FileNode::file("4", "b.ts", "")],
            ),
        ];
        match FileNode::validate_tree(&tree) {
            Err(VfsError::DuplicatePath(path)) => assert_eq!(path, "src/b.ts"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_slash_in_name() {
        let tree = vec![FileNode::file("1", "src/a.ts", "")];
        assert!(matches!(
            FileNode::validate_tree(&tree),
            Err(VfsError::InvalidName(_))
        ));
    }
}
