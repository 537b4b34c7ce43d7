//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads. Set once by the CLI before any
//! build; library users that never call [`init_config`] get the defaults.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use crate::config::ProjectConfig;

static CONFIG: LazyLock<ArcSwap<ProjectConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(ProjectConfig::default()));

/// Current configuration snapshot.
#[inline]
pub fn cfg() -> Arc<ProjectConfig> {
    CONFIG.load_full()
}

/// Install `config` for the rest of the process and hand it back.
pub fn init_config(config: ProjectConfig) -> Arc<ProjectConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
