//! `[externals]` section: specifiers bound to runtime globals.
//!
//! ```toml
//! [externals]
//! "lodash" = "_"
//! "react-dom" = ""      # empty removes a default
//! ```
//!
//! Entries merge over the defaults, which cover React loaded from UMD
//! scripts (see `[serve] scripts`).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

pub fn default_externals() -> BTreeMap<String, String> {
    [
        ("react", "React"),
        ("react-dom", "ReactDOM"),
        ("react-dom/client", "ReactDOM"),
        ("react/jsx-runtime", "React"),
        ("react/jsx-dev-runtime", "React"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn merge_externals<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut externals = default_externals();
    for (specifier, global) in BTreeMap::<String, String>::deserialize(deserializer)? {
        if global.trim().is_empty() {
            externals.remove(&specifier);
        } else {
            externals.insert(specifier, global);
        }
    }
    Ok(externals)
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_externals_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.externals.len(), 5);
        assert_eq!(config.externals["react-dom/client"], "ReactDOM");
    }

    #[test]
    fn test_externals_merge_and_remove() {
        let config = test_parse_config("[externals]\nlodash = \"_\"\n\"react-dom\" = \"\"");
        assert_eq!(config.externals["lodash"], "_");
        assert!(!config.externals.contains_key("react-dom"));
        assert!(config.externals.contains_key("react"));
    }
}
