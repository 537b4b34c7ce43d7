//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! entry_points = ["index.tsx", "src/index.tsx", "App.tsx", "src/App.tsx"]
//! extensions = [".ts", ".tsx", ".js", ".jsx", ".css", ".json"]
//! target = "es2020"                     # Syntax lowering target
//! source_attribute = "data-source-loc"  # Attribute written onto JSX elements
//! inject = "ast"                        # ast | pattern | off
//! sourcemap = true                      # Append an inline source map
//! minify = false                        # Minify the bundle (drops the source map)
//! jsx_import_source = "react"
//!
//! [build.define]
//! "process.env.NODE_ENV" = "\"development\""
//! ```
//!
//! `[build.define]` entries are merged over the defaults; values are JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// How JSX elements are annotated with their source location.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InjectStrategy {
    /// Walk the parsed syntax tree (exact positions).
    #[default]
    Ast,
    /// Regex scan over the raw text.
    Pattern,
    /// No annotation.
    Off,
}

/// Bundler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Entry candidates, probed in order.
    pub entry_points: Vec<String>,

    /// Extensions probed for extensionless specifiers.
    pub extensions: Vec<String>,

    /// ECMAScript target, e.g. `es2020`.
    pub target: String,

    pub source_attribute: String,

    pub inject: InjectStrategy,

    pub sourcemap: bool,

    pub minify: bool,

    /// Package providing `jsx-runtime`.
    pub jsx_import_source: String,

    /// Global identifier paths replaced by JSON values.
    #[serde(deserialize_with = "merge_define")]
    pub define: BTreeMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            entry_points: ["index.tsx", "src/index.tsx", "App.tsx", "src/App.tsx"]
                .map(String::from)
                .to_vec(),
            extensions: [".ts", ".tsx", ".js", ".jsx", ".css", ".json"]
                .map(String::from)
                .to_vec(),
            target: "es2020".into(),
            source_attribute: "data-source-loc".into(),
            inject: InjectStrategy::Ast,
            sourcemap: true,
            minify: false,
            jsx_import_source: "react".into(),
            define: default_define(),
        }
    }
}

fn default_define() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "process.env.NODE_ENV".to_string(),
        "\"development\"".to_string(),
    )])
}

fn merge_define<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut define = default_define();
    define.extend(BTreeMap::<String, String>::deserialize(deserializer)?);
    Ok(define)
}

impl BuildConfig {
    /// Collect problems into `errors`.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.entry_points.is_empty() {
            errors.push("[build] entry_points must not be empty".into());
        }
        if self.extensions.is_empty() {
            errors.push("[build] extensions must not be empty".into());
        }
        if self.target.trim().is_empty() {
            errors.push("[build] target must not be empty".into());
        }
        let attr = &self.source_attribute;
        if attr.is_empty()
            || !attr.starts_with(|c: char| c.is_ascii_alphabetic())
            || !attr.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push(format!(
                "[build] source_attribute `{attr}` is not a valid attribute name"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_build_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.target, "es2020");
        assert_eq!(config.build.inject, InjectStrategy::Ast);
        assert!(config.build.sourcemap);
        assert!(!config.build.minify);
        assert_eq!(config.build.entry_points.len(), 4);
    }

    #[test]
    fn test_build_config_override() {
        let config = test_parse_config(
            "[build]\ntarget = \"es2017\"\ninject = \"pattern\"\nsource_attribute = \"data-loc\"\nsourcemap = false",
        );
        assert_eq!(config.build.target, "es2017");
        assert_eq!(config.build.inject, InjectStrategy::Pattern);
        assert_eq!(config.build.source_attribute, "data-loc");
        assert!(!config.build.sourcemap);
        // untouched fields keep defaults
        assert_eq!(config.build.jsx_import_source, "react");
    }

    #[test]
    fn test_define_merges_with_defaults() {
        let config = test_parse_config("[build.define]\n__DEV__ = \"true\"");
        assert_eq!(config.build.define.len(), 2);
        assert_eq!(config.build.define["__DEV__"], "true");

        let config =
            test_parse_config("[build.define]\n\"process.env.NODE_ENV\" = \"\\\"production\\\"\"");
        assert_eq!(config.build.define["process.env.NODE_ENV"], "\"production\"");
    }

    #[test]
    fn test_inject_strategy_rejects_unknown() {
        let result: Result<crate::config::ProjectConfig, _> =
            toml::from_str("[build]\ninject = \"magic\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_attribute_name() {
        let mut errors = Vec::new();
        let build = BuildConfig {
            source_attribute: "data loc".into(),
            ..BuildConfig::default()
        };
        build.validate(&mut errors);
        assert_eq!(errors.len(), 1);

        let mut errors = Vec::new();
        BuildConfig::default().validate(&mut errors);
        assert!(errors.is_empty());
    }
}
