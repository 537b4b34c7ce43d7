//! Configuration management for `livepack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── externals  # [externals]
//! │   ├── serve      # [serve]
//! │   └── editor     # [editor]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! The file is optional: it is searched upward from the project, and
//! every section falls back to its defaults.

pub mod section;
pub mod types;
mod util;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use section::{BuildConfig, EditorConfig, InjectStrategy, ServeConfig};
pub use types::{ConfigError, cfg, init_config};
use util::find_config_file;

use crate::cli::{BuildArgs, Cli, Commands};
use crate::log;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing livepack.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Absolute path to the config file, empty when none was found (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: the project directory, or the directory of a project file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Bundler settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Specifier → global expression
    #[serde(
        default = "section::default_externals",
        deserialize_with = "section::merge_externals"
    )]
    pub externals: BTreeMap<String, String>,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Click-to-source settings
    #[serde(default)]
    pub editor: EditorConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            build: BuildConfig::default(),
            externals: section::default_externals(),
            serve: ServeConfig::default(),
            editor: EditorConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration for the CLI's project.
    ///
    /// Searches upward from the project for the config file; a missing
    /// file means defaults. CLI flags are applied last.
    pub fn load(cli: &Cli) -> Result<Self> {
        let project = cli.command.project();
        let project = project
            .canonicalize()
            .with_context(|| format!("Project `{}` not found", project.display()))?;
        let root = if project.is_dir() {
            project
        } else {
            project
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        };

        let mut config = match find_config_file(&cli.config, &root) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self::default()
            }
        };

        config.root = root;
        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Build { build_args, .. } => self.apply_build_args(build_args),
            Commands::Serve {
                build_args,
                interface,
                port,
                ws_port,
                watch,
            } => {
                self.apply_build_args(build_args);
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.ws_port, ws_port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
            Commands::Resolve { .. } => {}
            Commands::Inject { inject, .. } => {
                Self::update_option(&mut self.build.inject, inject.as_ref());
            }
        }
    }

    /// Apply build arguments from CLI.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.build.target, args.target.as_ref());
        Self::update_option(&mut self.build.sourcemap, args.sourcemap.as_ref());
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        Self::update_option(&mut self.build.inject, args.inject.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        self.build.validate(&mut errors);
        self.serve.validate(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors).into())
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<ProjectConfig, _> = toml::from_str("[build\ntarget = \"es2020\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = ProjectConfig::default();

        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.get_root(), Path::new(""));
        assert_eq!(config.build.target, "es2020");
        assert_eq!(config.serve.port, 5277);
        assert_eq!(config.externals["react"], "React");
    }

    #[test]
    fn test_empty_file_equals_defaults() {
        let parsed = test_parse_config("");
        let default = ProjectConfig::default();
        assert_eq!(parsed.build, default.build);
        assert_eq!(parsed.externals, default.externals);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\ntarget = \"es2019\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.build.target, "es2019");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "[build]\nentry_points = []\n[serve]\nport = 9000\nws_port = 9000",
        );
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("entry_points"));
        assert!(err.contains("ws_port"));
    }

    #[test]
    fn test_update_option() {
        let mut port = 5277u16;
        ProjectConfig::update_option(&mut port, None);
        assert_eq!(port, 5277);
        ProjectConfig::update_option(&mut port, Some(&8080));
        assert_eq!(port, 8080);
    }
}
