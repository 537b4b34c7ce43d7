//! Bundle diagnostics.

use std::fmt;

use thiserror::Error;

use crate::vfs::VfsError;

/// A single bundling failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("No entry point found (looked for {})", .candidates.join(", "))]
    NoEntryPoint { candidates: Vec<String> },

    #[error("Could not resolve \"{specifier}\" from \"{importer}\"")]
    Unresolved { specifier: String, importer: String },

    #[error("No loader is configured for \"{extension}\" files: {path}")]
    NoLoader { path: String, extension: String },

    #[error("{path}:{line}:{column}: ERROR: {message}")]
    Compile {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error(transparent)]
    Index(#[from] VfsError),

    #[error("Engine initialization failed: {0}")]
    Engine(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Every diagnostic of one build, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleErrors(pub Vec<BundleError>);

impl BundleErrors {
    pub fn push(&mut self, err: BundleError) {
        self.0.push(err);
    }

    pub fn extend(&mut self, errs: impl IntoIterator<Item = BundleError>) {
        self.0.extend(errs);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<BundleError> for BundleErrors {
    fn from(err: BundleError) -> Self {
        Self(vec![err])
    }
}

/// Newline-joined, one diagnostic per line.
impl fmt::Display for BundleErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BundleErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_names_both_sides() {
        let err = BundleError::Unresolved {
            specifier: "./Missing".into(),
            importer: "src/App.tsx".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("./Missing"));
        assert!(msg.contains("src/App.tsx"));
    }

    #[test]
    fn test_no_entry_mentions_entry_point() {
        let err = BundleError::NoEntryPoint {
            candidates: vec!["index.tsx".into(), "App.tsx".into()],
        };
        assert_eq!(
            err.to_string(),
            "No entry point found (looked for index.tsx, App.tsx)"
        );
    }

    #[test]
    fn test_index_error_keeps_its_type() {
        let err = BundleError::from(VfsError::DuplicatePath("src/a.ts".into()));
        assert_eq!(err.to_string(), "duplicate path `src/a.ts` in file tree");
        assert!(matches!(err, BundleError::Index(VfsError::DuplicatePath(ref p)) if p == "src/a.ts"));
    }

    #[test]
    fn test_errors_join_with_newline() {
        let mut errs = BundleErrors::default();
        errs.push(BundleError::Internal("a".into()));
        errs.push(BundleError::Internal("b".into()));
        assert_eq!(errs.to_string(), "Internal error: a\nInternal error: b");
    }
}
