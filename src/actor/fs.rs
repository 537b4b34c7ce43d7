//! FileSystem Actor
//!
//! Watches the project on disk and turns changes into tree snapshots for
//! the DebounceActor. A project directory is watched recursively; a
//! project JSON file is watched through its parent directory.
//!
//! ```text
//! notify (sync) → bridge thread → FsActor → load snapshot → DebounceMsg::Tree
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::messages::DebounceMsg;
use crate::vfs;

/// FileSystem Actor - reloads the project when relevant files change
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge), taken by `run`
    notify_rx: Option<std::sync::mpsc::Receiver<notify::Result<notify::Event>>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    /// Project directory or JSON file
    project: PathBuf,
    debounce_tx: mpsc::Sender<DebounceMsg>,
    /// Fingerprint of the last snapshot sent, to skip no-op saves
    last_fingerprint: Option<u64>,
}

impl FsActor {
    /// Create a new FsActor; the watcher starts immediately and buffers
    /// events while the caller performs the initial build.
    pub fn new(project: PathBuf, debounce_tx: mpsc::Sender<DebounceMsg>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        if project.is_dir() {
            watcher.watch(&project, RecursiveMode::Recursive)?;
        } else {
            let parent = project.parent().unwrap_or(Path::new("."));
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        Ok(Self {
            notify_rx: Some(notify_rx),
            _watcher: watcher,
            project,
            debounce_tx,
            last_fingerprint: None,
        })
    }

    /// Fingerprint of the tree already built, so an unchanged reload is skipped.
    pub fn set_baseline(&mut self, fingerprint: Option<u64>) {
        self.last_fingerprint = fingerprint;
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let Some(notify_rx) = self.notify_rx.take() else {
            return;
        };
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        while let Some(event) = async_rx.recv().await {
            let mut relevant = self.is_relevant(&event);
            // Drain whatever else is already queued; one reload covers it all
            while let Ok(event) = async_rx.try_recv() {
                relevant |= self.is_relevant(&event);
            }
            if !relevant {
                continue;
            }

            let Some(snapshot) = self.reload().await else {
                continue;
            };
            if self.debounce_tx.send(DebounceMsg::Tree(snapshot)).await.is_err() {
                break;
            }
        }
        crate::debug!("watch"; "watcher stopped");
    }

    /// Whether an event touches a file that belongs in the tree.
    fn is_relevant(&self, event: &notify::Event) -> bool {
        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // Metadata-only changes (mtime/chmod) would loop on some editors
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return false,
            EventKind::Modify(_) => {}
            _ => return false,
        }

        event.paths.iter().any(|path| {
            if is_temp_file(path) {
                return false;
            }
            if self.project.is_dir() {
                path.strip_prefix(&self.project)
                    .map(|rel| !vfs::is_skipped(rel))
                    .unwrap_or(false)
            } else {
                path.file_name() == self.project.file_name()
            }
        })
    }

    /// Load the project; `None` when loading fails or nothing changed.
    async fn reload(&mut self) -> Option<Arc<Vec<vfs::FileNode>>> {
        let project = self.project.clone();
        let loaded = tokio::task::spawn_blocking(move || vfs::load_project(&project)).await;

        let tree = match loaded {
            Ok(Ok(project)) => project.structure,
            Ok(Err(e)) => {
                // Half-written JSON during a save; the next event retries
                crate::debug!("watch"; "reload skipped: {}", e);
                return None;
            }
            Err(e) => {
                crate::log!("watch"; "reload task failed: {}", e);
                return None;
            }
        };

        let fingerprint = vfs::tree::fingerprint(&tree);
        if self.last_fingerprint == Some(fingerprint) {
            crate::debug!("watch"; "content unchanged");
            return None;
        }
        self.last_fingerprint = Some(fingerprint);
        crate::debug!("watch"; "tree changed ({:016x})", fingerprint);
        Some(Arc::new(tree))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
