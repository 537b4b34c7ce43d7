//! Build options resolved from configuration.

use std::collections::BTreeMap;

use crate::config::{InjectStrategy, ProjectConfig};

/// Everything a build reads besides the file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Entry candidates, probed in order.
    pub entry_points: Vec<String>,
    /// Extensions probed for extensionless specifiers, with leading dot.
    pub extensions: Vec<String>,
    /// ECMAScript target for syntax lowering.
    pub target: String,
    /// Attribute written onto intrinsic JSX elements.
    pub source_attribute: String,
    pub inject: InjectStrategy,
    /// Append an inline source map to the bundle.
    pub sourcemap: bool,
    /// Minify the emitted bundle; no source map is written.
    pub minify: bool,
    /// Package the automatic JSX runtime is imported from.
    pub jsx_import_source: String,
    /// Global identifier paths mapped to JSON values.
    pub define: BTreeMap<String, String>,
    /// Specifiers bound to runtime globals instead of virtual files.
    pub externals: BTreeMap<String, String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&ProjectConfig::default())
    }
}

impl From<&ProjectConfig> for BuildOptions {
    fn from(config: &ProjectConfig) -> Self {
        let build = &config.build;
        Self {
            entry_points: build.entry_points.clone(),
            extensions: build
                .extensions
                .iter()
                .map(|ext| {
                    if ext.starts_with('.') {
                        ext.clone()
                    } else {
                        format!(".{ext}")
                    }
                })
                .collect(),
            target: build.target.clone(),
            source_attribute: build.source_attribute.clone(),
            inject: build.inject,
            sourcemap: build.sourcemap,
            minify: build.minify,
            jsx_import_source: build.jsx_import_source.clone(),
            define: build.define.clone(),
            externals: config.externals.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let options = BuildOptions::default();
        assert_eq!(
            options.entry_points,
            vec!["index.tsx", "src/index.tsx", "App.tsx", "src/App.tsx"]
        );
        assert_eq!(
            options.extensions,
            vec![".ts", ".tsx", ".js", ".jsx", ".css", ".json"]
        );
        assert_eq!(options.target, "es2020");
        assert_eq!(options.source_attribute, "data-source-loc");
        assert_eq!(options.inject, InjectStrategy::Ast);
        assert_eq!(
            options.define.get("process.env.NODE_ENV").map(String::as_str),
            Some("\"development\"")
        );
        assert_eq!(
            options.externals.get("react").map(String::as_str),
            Some("React")
        );
    }

    #[test]
    fn test_cli_style_overrides() {
        let config = test_parse_config("[build]\nminify = true\nsourcemap = false\ntarget = \"es2017\"");
        let options = BuildOptions::from(&config);
        assert!(options.minify);
        assert!(!options.sourcemap);
        assert_eq!(options.target, "es2017");
    }

    #[test]
    fn test_extensions_get_leading_dot() {
        let config = test_parse_config("[build]\nextensions = [\"ts\", \".mjs\"]");
        let options = BuildOptions::from(&config);
        assert_eq!(options.extensions, vec![".ts", ".mjs"]);
    }
}
