//! livepack - bundle TSX/JSX projects in memory and preview them live.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use livepack::cli::{self, Cli, Commands};
use livepack::config::{ProjectConfig, init_config};
use livepack::core;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(ProjectConfig::load(&cli)?);
    let project = cli.command.project();

    match &cli.command {
        Commands::Build { output, .. } => {
            cli::build::build_project(&config, project, output.as_deref())
        }
        Commands::Serve { .. } => cli::serve::bind_server(project.to_path_buf())?.run(),
        Commands::Resolve {
            specifier, from, ..
        } => cli::inspect::resolve(&config, project, specifier, from.as_deref()),
        Commands::Inject { file, .. } => cli::inspect::inject_file(&config, project, file),
    }
}
