//! Compiler engine lifecycle.
//!
//! The process-wide engine is created on first use and shared afterwards.
//! Concurrent first callers wait on the same initialization; a failed
//! initialization resets the state so the next call tries again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::OnceCell;

use super::BundleResult;
use super::compile::transform_options;
use super::emit::{define_prelude, validate_externals};
use super::error::{BundleError, BundleErrors};
use super::graph::bundle_tree;
use super::options::BuildOptions;
use crate::vfs::FileNode;

/// Where the global engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
}

impl EngineState {
    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Initializing,
            2 => Self::Ready,
            _ => Self::Uninitialized,
        }
    }
}

/// A lazily built engine and where its initialization stands.
pub struct EngineSlot {
    cell: OnceCell<Engine>,
    state: AtomicU8,
}

impl EngineSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
            state: AtomicU8::new(EngineState::Uninitialized as u8),
        }
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// The engine, running `make` on the blocking pool if none is built yet.
    ///
    /// Concurrent callers share one attempt. After a failure the slot is
    /// empty again and the next call retries.
    pub async fn get_or_init<F>(&self, make: F) -> Result<&Engine, BundleError>
    where
        F: FnOnce() -> Result<Engine, BundleError> + Send + 'static,
    {
        self.cell
            .get_or_try_init(|| async {
                self.set_state(EngineState::Initializing);
                let result = tokio::task::spawn_blocking(make)
                    .await
                    .map_err(|e| BundleError::Internal(format!("engine initialization task: {e}")))
                    .and_then(|engine| engine);
                match &result {
                    Ok(_) => {
                        self.set_state(EngineState::Ready);
                        crate::debug!("engine"; "ready");
                    }
                    Err(e) => {
                        self.set_state(EngineState::Uninitialized);
                        crate::log!("engine"; "initialization failed: {}", e);
                    }
                }
                result
            })
            .await
    }
}

impl Default for EngineSlot {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: EngineSlot = EngineSlot::new();

/// Current state of the global engine.
pub fn state() -> EngineState {
    GLOBAL.state()
}

/// The process-wide engine, built from the global config on first call.
pub async fn global() -> Result<&'static Engine, BundleError> {
    let options = BuildOptions::from(crate::config::cfg().as_ref());
    GLOBAL.get_or_init(move || Engine::new(options)).await
}

/// A configured bundler.
#[derive(Debug, Clone)]
pub struct Engine {
    options: Arc<BuildOptions>,
}

const PROBE_PATH: &str = "__livepack_probe__.tsx";
const PROBE_SOURCE: &str = "const probe: number = 1;\nexport default probe;\n";

impl Engine {
    /// Validate `options` and warm the pipeline with a probe compile.
    pub fn new(options: BuildOptions) -> Result<Self, BundleError> {
        transform_options(&options)?;
        define_prelude(&options.define)?;
        validate_externals(&options)?;

        let probe_options = BuildOptions {
            entry_points: vec![PROBE_PATH.to_string()],
            ..options.clone()
        };
        let probe = [FileNode::file("probe", PROBE_PATH, PROBE_SOURCE)];
        bundle_tree(&probe, &probe_options)
            .map_err(|errs| BundleError::Engine(format!("probe build failed: {errs}")))?;

        Ok(Self {
            options: Arc::new(options),
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build `tree` on the current thread.
    pub fn bundle(&self, tree: &[FileNode]) -> Result<String, BundleErrors> {
        bundle_tree(tree, &self.options)
    }

    /// Build `tree` on the blocking pool.
    ///
    /// A panic inside the build is reported as an error result.
    pub async fn build(&self, tree: Vec<FileNode>) -> BundleResult {
        let engine = self.clone();
        match tokio::task::spawn_blocking(move || engine.bundle(&tree)).await {
            Ok(result) => result.into(),
            Err(e) => BundleResult::Error(
                BundleError::Internal(format!("build task failed: {e}")).to_string(),
            ),
        }
    }
}
