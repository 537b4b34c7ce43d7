//! Load hook: content and loader for a virtual path.

use super::error::BundleError;
use crate::vfs::FileIndex;

/// How a module's content is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Ts,
    Tsx,
    Js,
    Jsx,
    Css,
    Json,
    Text,
}

impl Loader {
    /// Loader for a path, by extension.
    pub fn for_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
        Some(match ext {
            "ts" | "mts" | "cts" => Self::Ts,
            "tsx" => Self::Tsx,
            "js" | "mjs" | "cjs" => Self::Js,
            "jsx" => Self::Jsx,
            "css" => Self::Css,
            "json" => Self::Json,
            "txt" | "md" | "svg" => Self::Text,
            _ => return None,
        })
    }

    /// Sources that may carry JSX and go through the injector. Plain
    /// `.js` is included: generated projects often write components there.
    pub const fn has_jsx(self) -> bool {
        matches!(self, Self::Tsx | Self::Jsx | Self::Js)
    }

    pub const fn is_script(self) -> bool {
        matches!(self, Self::Ts | Self::Tsx | Self::Js | Self::Jsx)
    }
}

/// A loaded module ready for compilation.
#[derive(Debug, Clone, Copy)]
pub struct Loaded<'a> {
    pub path: &'a str,
    pub contents: &'a str,
    pub loader: Loader,
}

/// Read `path` from the index and pick its loader.
pub fn load<'a>(index: &FileIndex<'a>, path: &'a str) -> Result<Loaded<'a>, BundleError> {
    let contents = index.content(path).ok_or_else(|| BundleError::Internal(format!(
        "resolved module `{path}` is missing from the file index"
    )))?;
    let loader = Loader::for_path(path).ok_or_else(|| BundleError::NoLoader {
        path: path.to_string(),
        extension: path
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{ext}"))
            .unwrap_or_default(),
    })?;
    Ok(Loaded {
        path,
        contents,
        loader,
    })
}
