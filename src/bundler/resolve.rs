//! Module resolution over the virtual file index.
//!
//! Resolution is a pure function of `(specifier, importer, index, options)`:
//!
//! 1. externals: configured specifiers bind to runtime globals
//! 2. `./` and `../` join the importer's directory (URL dot-segment rules)
//! 3. anything else is an absolute virtual path (leading `/` stripped)
//! 4. probe: exact path, then `<path><ext>`, then `<path>/index<ext>`

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use super::error::BundleError;
use super::options::BuildOptions;
use crate::vfs::FileIndex;

/// Canonical identity of a module in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleId {
    /// A file in the virtual tree.
    Virtual(String),
    /// A specifier bound to a runtime global.
    External(String),
}

impl ModuleId {
    /// Key used in the bundle's module table.
    pub fn key(&self) -> String {
        match self {
            Self::Virtual(path) => path.clone(),
            Self::External(specifier) => format!("external:{specifier}"),
        }
    }

    pub fn as_virtual(&self) -> Option<&str> {
        match self {
            Self::Virtual(path) => Some(path),
            Self::External(_) => None,
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual(path) => f.write_str(path),
            Self::External(specifier) => write!(f, "{specifier} (external)"),
        }
    }
}

/// Resolver bound to one index and one set of options.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a FileIndex<'a>,
    options: &'a BuildOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a FileIndex<'a>, options: &'a BuildOptions) -> Self {
        Self { index, options }
    }

    /// Resolve `specifier` as imported from the file at `importer`.
    pub fn resolve(&self, specifier: &str, importer: &str) -> Result<ModuleId, BundleError> {
        if self.options.externals.contains_key(specifier) {
            return Ok(ModuleId::External(specifier.to_string()));
        }

        let unresolved = || BundleError::Unresolved {
            specifier: specifier.to_string(),
            importer: importer.to_string(),
        };

        let candidate = if is_relative(specifier) {
            join_relative(specifier, importer).ok_or_else(unresolved)?
        } else {
            specifier.trim_start_matches('/').to_string()
        };

        self.probe(&candidate)
            .map(ModuleId::Virtual)
            .ok_or_else(unresolved)
    }

    /// Exact match, then extension probe, then index probe.
    fn probe(&self, candidate: &str) -> Option<String> {
        if self.index.contains(candidate) {
            return Some(candidate.to_string());
        }

        let base = candidate.trim_end_matches('/');
        if !base.is_empty() {
            for ext in &self.options.extensions {
                let path = format!("{base}{ext}");
                if self.index.contains(&path) {
                    return Some(path);
                }
            }
        }

        for ext in &self.options.extensions {
            let path = if base.is_empty() {
                format!("index{ext}")
            } else {
                format!("{base}/index{ext}")
            };
            if self.index.contains(&path) {
                return Some(path);
            }
        }

        None
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

/// Join a relative specifier against the importer's directory.
///
/// `..` past the root clamps at the root. Percent-escapes introduced by
/// URL joining are decoded so paths with spaces round-trip.
fn join_relative(specifier: &str, importer: &str) -> Option<String> {
    let base = Url::parse(&format!("file:///{}", importer.trim_start_matches('/'))).ok()?;
    let joined = base.join(specifier).ok()?;
    let path = percent_decode_str(joined.path()).decode_utf8().ok()?;
    Some(path.trim_start_matches('/').to_string())
}

/// First entry candidate present in the index.
pub fn find_entry(index: &FileIndex<'_>, candidates: &[String]) -> Result<String, BundleError> {
    candidates
        .iter()
        .find(|c| index.contains(c.trim_start_matches('/')))
        .map(|c| c.trim_start_matches('/').to_string())
        .ok_or_else(|| BundleError::NoEntryPoint {
            candidates: candidates.to_vec(),
        })
}
