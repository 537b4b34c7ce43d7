//! `livepack build`: one-shot bundle of a project.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use crate::bundler::{BuildOptions, Engine};
use crate::config::ProjectConfig;
use crate::{log, vfs};

/// Bundle `project` and write the script to `output`, or stdout.
pub fn build_project(config: &ProjectConfig, project: &Path, output: Option<&Path>) -> Result<()> {
    let loaded = vfs::load_project(project)
        .with_context(|| format!("Failed to load project `{}`", project.display()))?;
    let engine =
        Engine::new(BuildOptions::from(config)).context("Failed to start the bundler engine")?;

    let started = Instant::now();
    let code = match engine.bundle(&loaded.structure) {
        Ok(code) => code,
        Err(errors) => {
            for error in &errors.0 {
                log!("error"; "{}", error);
            }
            let n = errors.len();
            bail!("build failed with {} error{}", n, if n == 1 { "" } else { "s" });
        }
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, &code).with_context(|| format!("Failed to write {}", path.display()))?;
            log!(
                "bundle";
                "{} → {} ({:.1} KiB, {}ms)",
                loaded.name,
                path.display(),
                code.len() as f64 / 1024.0,
                started.elapsed().as_millis()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(code.as_bytes())?;
            stdout.flush()?;
            crate::debug!("bundle"; "{} bytes in {}ms", code.len(), started.elapsed().as_millis());
        }
    }

    Ok(())
}
