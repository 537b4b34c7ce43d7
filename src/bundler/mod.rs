//! Bundling pipeline.
//!
//! ```text
//! Vec<FileNode> ──► FileIndex ──► find_entry ──► walk (waves, rayon)
//!                                                 │ load ─► inject ─► transpile ─► rewrite
//!                                                 ▼
//!                                               emit ──► BundleResult
//! ```
//!
//! [`build`] is the single entry point used by the preview server: it
//! never fails, returning either the bundle or the newline-joined
//! diagnostics of the whole graph.

mod compile;
mod emit;
pub mod engine;
mod error;
mod graph;
pub mod inject;
mod loader;
mod location;
mod options;
pub mod resolve;
mod rewrite;


use serde::{Deserialize, Serialize};

use crate::vfs::FileNode;

pub use engine::{Engine, EngineState};
pub use error::{BundleError, BundleErrors};
pub use graph::{Graph, walk};
pub use inject::{Injected, inject};
pub use loader::Loader;
pub use location::{LineIndex, ParseLocationError, SourceLocation};
pub use options::BuildOptions;
pub use resolve::{ModuleId, Resolver, find_entry};

/// Outcome of one build: exactly one of code or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleResult {
    Code(String),
    Error(String),
}

impl BundleResult {
    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code(_))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Code(code) => Some(code),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Code(_) => None,
            Self::Error(error) => Some(error),
        }
    }
}

impl From<Result<String, BundleErrors>> for BundleResult {
    fn from(result: Result<String, BundleErrors>) -> Self {
        match result {
            Ok(code) => Self::Code(code),
            Err(errors) => Self::Error(errors.to_string()),
        }
    }
}

/// Bundle `tree` with the global engine.
pub async fn build(tree: Vec<FileNode>) -> BundleResult {
    match engine::global().await {
        Ok(engine) => engine.build(tree).await,
        Err(e) => BundleResult::Error(e.to_string()),
    }
}
