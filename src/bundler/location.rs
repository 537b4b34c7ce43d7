//! Source positions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 1-based position in a virtual file, rendered as `path:line:column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub path: String,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(path: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

/// Parse error for a `path:line:column` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid source location `{0}`")]
pub struct ParseLocationError(pub String);

impl FromStr for SourceLocation {
    type Err = ParseLocationError;

    /// Paths may contain `:`, so numbers are taken from the right.
    /// A missing column reads as 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseLocationError(s.to_string());
        let mut parts = s.rsplitn(3, ':');
        let last = parts.next().ok_or_else(invalid)?;
        let middle = parts.next().ok_or_else(invalid)?;

        let (path, line, column) = match (middle.parse::<usize>(), parts.next()) {
            (Ok(line), Some(path)) => (path, line, last.parse().map_err(|_| invalid())?),
            _ => {
                // `path:line`, where `middle` is the tail of the path
                let line = last.parse().map_err(|_| invalid())?;
                let path = &s[..s.len() - last.len() - 1];
                (path, line, 1)
            }
        };

        if path.is_empty() || line == 0 || column == 0 {
            return Err(invalid());
        }
        Ok(Self::new(path, line, column))
    }
}

/// Byte offset to line/column conversion for one source text.
pub struct LineIndex<'s> {
    source: &'s str,
    /// Byte offset of each line start.
    starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { source, starts }
    }

    /// 1-based line and column (in characters) of a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        (line + 1, column + 1)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
