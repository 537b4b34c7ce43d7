//! Virtual project file tree.
//!
//! # Module Structure
//!
//! ```text
//! vfs/
//! ├── node.rs    # FileNode, NodeKind, ChangeMarker
//! ├── index.rs   # FileIndex (path -> file lookup)
//! ├── tree.rs    # generated-project intake, editing, fingerprint
//! └── load.rs    # projects from a directory or JSON file
//! ```
//!
//! The tree lives only in memory. Nothing in the bundler touches the
//! filesystem; `load` exists for the CLI.

mod index;
mod load;
mod node;
pub mod tree;

pub use index::FileIndex;
pub use load::{is_skipped, load_dir, load_project, parse_project_json};
pub use node::{ChangeMarker, FileNode, NodeKind};
pub use tree::{GeneratedFile, GeneratedProject};

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A project owns its tree exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub structure: Vec<FileNode>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, rename = "lastSaved")]
    pub last_saved: u64,
}

/// File tree errors.
#[derive(Debug, Clone, Error)]
pub enum VfsError {
    #[error("duplicate path `{0}` in file tree")]
    DuplicatePath(String),

    #[error("invalid file name `{0}`")]
    InvalidName(String),

    /// A generated path with empty, `.` or `..` segments.
    #[error("invalid path `{0}`")]
    InvalidPath(String),

    #[error("`{0}` is not a folder")]
    NotAFolder(String),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] Arc<std::io::Error>),

    #[error("invalid project JSON in `{0}`")]
    Json(PathBuf, #[source] Arc<serde_json::Error>),

    #[error("failed to walk project directory: {0}")]
    Walk(String),
}

/// Source errors compare by what they report, not by identity.
impl PartialEq for VfsError {
    fn eq(&self, other: &Self) -> bool {
        use VfsError::*;
        match (self, other) {
            (DuplicatePath(a), DuplicatePath(b))
            | (InvalidName(a), InvalidName(b))
            | (InvalidPath(a), InvalidPath(b))
            | (NotAFolder(a), NotAFolder(b))
            | (Walk(a), Walk(b)) => a == b,
            (Io(a, e), Io(b, f)) => a == b && e.kind() == f.kind(),
            (Json(a, e), Json(b, f)) => {
                a == b
                    && e.classify() == f.classify()
                    && (e.line(), e.column()) == (f.line(), f.column())
            }
            _ => false,
        }
    }
}

impl Eq for VfsError {}
