//! `livepack resolve` and `livepack inject`: look at one step of the
//! pipeline in isolation.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::bundler::{BuildOptions, Resolver, find_entry, inject};
use crate::config::ProjectConfig;
use crate::vfs::{self, FileIndex};

/// Print what `specifier` resolves to when imported from `from`.
pub fn resolve(config: &ProjectConfig, project: &Path, specifier: &str, from: Option<&str>) -> Result<()> {
    let loaded = load(project)?;
    let index = FileIndex::build(&loaded.structure).context("Invalid file tree")?;
    let options = BuildOptions::from(config);

    let importer = match from {
        Some(path) => path.trim_start_matches('/').to_string(),
        None => find_entry(&index, &options.entry_points)?,
    };
    if !index.contains(&importer) {
        return Err(anyhow!("`{}` is not a file in the project", importer));
    }

    let resolved = Resolver::new(&index, &options).resolve(specifier, &importer)?;
    println!("{}", resolved.key());
    Ok(())
}

/// Print `file` with source locations injected.
pub fn inject_file(config: &ProjectConfig, project: &Path, file: &str) -> Result<()> {
    let loaded = load(project)?;
    let index = FileIndex::build(&loaded.structure).context("Invalid file tree")?;
    let path = file.trim_start_matches('/');
    let source = index
        .content(path)
        .ok_or_else(|| anyhow!("`{}` is not a file in the project", path))?;

    let build = &config.build;
    let injected = inject(source, path, &build.source_attribute, build.inject);
    if injected.fallback {
        crate::log!("inject"; "{} did not parse, printed unchanged", path);
    } else {
        crate::debug!("inject"; "{} elements annotated", injected.annotated);
    }
    print!("{}", injected.code);
    Ok(())
}

fn load(project: &Path) -> Result<vfs::Project> {
    vfs::load_project(project)
        .with_context(|| format!("Failed to load project `{}`", project.display()))
}
