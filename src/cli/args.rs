//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::InjectStrategy;

/// Bundle and live-preview React/TypeScript projects
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the project (default: livepack.toml)
    #[arg(short = 'C', long, global = true, default_value = "livepack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Bundle a project into one script
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Write the bundle here instead of stdout
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Start the preview server with live rebuilds
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Port for the preview WebSocket
        #[arg(long)]
        ws_port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Show how a specifier resolves inside a project
    #[command(visible_alias = "r")]
    Resolve {
        /// Project directory or project JSON file
        #[arg(value_hint = clap::ValueHint::AnyPath)]
        project: PathBuf,

        /// Import specifier, e.g. `./components/Button` or `react`
        specifier: String,

        /// Importing file (default: the entry point)
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Print a file with source locations injected
    #[command(visible_alias = "i")]
    Inject {
        /// Project directory or project JSON file
        #[arg(value_hint = clap::ValueHint::AnyPath)]
        project: PathBuf,

        /// Project-relative file path
        file: String,

        /// Injection strategy
        #[arg(long, value_enum)]
        inject: Option<InjectStrategy>,
    },
}

impl Commands {
    /// Project path the command operates on.
    pub fn project(&self) -> &Path {
        match self {
            Self::Build { build_args, .. } | Self::Serve { build_args, .. } => &build_args.project,
            Self::Resolve { project, .. } | Self::Inject { project, .. } => project,
        }
    }
}

/// Shared build arguments for Build and Serve commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Project directory or project JSON file
    #[arg(default_value = ".", value_hint = clap::ValueHint::AnyPath)]
    pub project: PathBuf,

    /// ECMAScript target for syntax lowering (e.g. es2020)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Append an inline source map
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub sourcemap: Option<bool>,

    /// Minify the bundle
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Source-location injection strategy
    #[arg(long, value_enum)]
    pub inject: Option<InjectStrategy>,
}
