//! Actor Coordinator - Wires up the Preview Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Runs the initial build
//! - Wires up actors and runs them concurrently

mod runtime;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::compiler::CompilerActor;
use super::debounce::DebounceActor;
use super::editor::EditorActor;
use super::fs::FsActor;
use super::messages::{CompilerMsg, DebounceMsg, EditorMsg, WsMsg};
use super::ws::{WsActor, start_ws_server_with_channel};
use crate::config::ProjectConfig;
use crate::vfs;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<ProjectConfig>,
    /// Project directory or JSON file
    project: PathBuf,
    ws_port: Option<u16>,
    shutdown_rx: Option<Receiver<()>>,
    /// Called with the bound WebSocket port
    on_ws_port: Option<Box<dyn FnOnce(u16) + Send>>,
}

impl Coordinator {
    /// Create from Arc<ProjectConfig>.
    pub fn with_config(config: Arc<ProjectConfig>, project: PathBuf) -> Self {
        Self {
            config,
            project,
            ws_port: None,
            shutdown_rx: None,
            on_ws_port: None,
        }
    }

    /// Set WebSocket port; `on_bound` receives the port actually bound.
    pub fn with_ws_port(mut self, port: u16, on_bound: impl FnOnce(u16) + Send + 'static) -> Self {
        self.ws_port = Some(port);
        self.on_ws_port = Some(Box::new(on_bound));
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (debounce_tx, debounce_rx) = mpsc::channel::<DebounceMsg>(CHANNEL_BUFFER);
        let (compiler_tx, compiler_rx) = mpsc::channel::<CompilerMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);
        let (editor_tx, editor_rx) = mpsc::channel::<EditorMsg>(CHANNEL_BUFFER);

        if let Some(port) = self.ws_port {
            let port = start_ws_server_with_channel(self.config.serve.interface, port, ws_tx.clone())?;
            crate::debug!("ws"; "listening on {}", port);
            if let Some(on_bound) = self.on_ws_port.take() {
                on_bound(port);
            }
        }

        let engine = crate::bundler::engine::global()
            .await
            .map_err(|e| anyhow::anyhow!("bundler engine failed to start: {}", e))?;

        // Watcher first, so edits made during the initial build are not lost
        let mut fs_actor = if self.config.serve.watch {
            let fs = FsActor::new(self.project.clone(), debounce_tx.clone())
                .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
            Some(fs)
        } else {
            None
        };
        let initial = self.initial_build(&compiler_tx).await;
        if let Some(fs) = fs_actor.as_mut() {
            fs.set_baseline(initial);
        }

        let debounce_actor = DebounceActor::new(
            debounce_rx,
            compiler_tx,
            Duration::from_millis(self.config.serve.debounce_ms),
        );
        let compiler_actor = CompilerActor::new(compiler_rx, ws_tx, engine);
        let ws_actor = WsActor::new(ws_rx, editor_tx);
        let editor_actor = EditorActor::new(
            editor_rx,
            self.config.editor.clone(),
            self.config.get_root().to_path_buf(),
        );

        crate::debug!("actor"; "start");
        let shutdown_rx = self.shutdown_rx.take();
        runtime::run_actors(
            fs_actor,
            debounce_actor,
            compiler_actor,
            ws_actor,
            editor_actor,
            debounce_tx,
            shutdown_rx,
        )
        .await?;

        crate::debug!("actor"; "stopped");
        Ok(())
    }

    /// Queue the first build; returns the tree fingerprint when the
    /// project loaded.
    async fn initial_build(&self, compiler_tx: &mpsc::Sender<CompilerMsg>) -> Option<u64> {
        let project = self.project.clone();
        let loaded = tokio::task::spawn_blocking(move || vfs::load_project(&project)).await;

        match loaded {
            Ok(Ok(project)) => {
                let fingerprint = vfs::tree::fingerprint(&project.structure);
                crate::log!("serve"; "project `{}` loaded", project.name);
                let _ = compiler_tx
                    .send(CompilerMsg::Build(Arc::new(project.structure)))
                    .await;
                Some(fingerprint)
            }
            Ok(Err(e)) => {
                crate::logger::status_error("failed to load project", &format!("{:#}", anyhow::Error::from(e)));
                None
            }
            Err(e) => {
                crate::log!("serve"; "project load task failed: {}", e);
                None
            }
        }
    }
}
