//! `[editor]` section configuration.
//!
//! ```toml
//! [editor]
//! command = "code --goto {file}:{line}:{column}"
//! ```
//!
//! Without a command, navigation requests are only logged.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bundler::SourceLocation;

/// Click-to-source target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Command template; `{file}`, `{line}` and `{column}` are substituted.
    pub command: Option<String>,
}

impl EditorConfig {
    /// Program and arguments for opening `location` under `root`.
    pub fn render(&self, location: &SourceLocation, root: &Path) -> Option<(String, Vec<String>)> {
        let template = self.command.as_deref()?;
        let file = root.join(&location.path);
        let file = file.to_string_lossy();

        let mut parts = template.split_whitespace().map(|part| {
            part.replace("{file}", &file)
                .replace("{line}", &location.line.to_string())
                .replace("{column}", &location.column.to_string())
        });
        let program = parts.next()?;
        Some((program, parts.collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_editor_default_has_no_command() {
        let config = test_parse_config("");
        assert!(config.editor.command.is_none());
        let loc = SourceLocation::new("a.tsx", 1, 1);
        assert!(config.editor.render(&loc, Path::new("/p")).is_none());
    }

    #[test]
    fn test_editor_render() {
        let config = test_parse_config("[editor]\ncommand = \"code --goto {file}:{line}:{column}\"");
        let loc = SourceLocation::new("src/App.tsx", 12, 5);
        let (program, args) = config.editor.render(&loc, Path::new("/proj")).unwrap();
        assert_eq!(program, "code");
        assert_eq!(args, vec!["--goto", "/proj/src/App.tsx:12:5"]);
    }

    #[test]
    fn test_editor_blank_command() {
        let config = test_parse_config("[editor]\ncommand = \"   \"");
        let loc = SourceLocation::new("a.tsx", 1, 1);
        assert!(config.editor.render(&loc, Path::new("/p")).is_none());
    }
}
