//! Editor Actor
//!
//! Handles click-to-source: every `navigate` from a preview is logged and,
//! when `[editor] command` is set, opens the file at the clicked position.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tokio::sync::mpsc;

use super::messages::EditorMsg;
use crate::bundler::SourceLocation;
use crate::config::EditorConfig;

/// Editor Actor - opens source locations
pub struct EditorActor {
    rx: mpsc::Receiver<EditorMsg>,
    editor: EditorConfig,
    /// Directory the project's relative paths are joined to
    root: PathBuf,
}

impl EditorActor {
    pub fn new(rx: mpsc::Receiver<EditorMsg>, editor: EditorConfig, root: PathBuf) -> Self {
        Self { rx, editor, root }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                EditorMsg::Open(location) => self.open(&location),
                EditorMsg::Shutdown => {
                    crate::debug!("editor"; "shutting down");
                    break;
                }
            }
        }
    }

    fn open(&self, location: &SourceLocation) {
        crate::log!("editor"; "{}", location);

        let Some((program, args)) = self.editor.render(location, &self.root) else {
            return;
        };
        crate::debug!("editor"; "exec: {} {}", program, args.join(" "));

        let child = Command::new(&program)
            .args(&args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match child {
            // Reap in the background so finished editors don't linger as zombies
            Ok(mut child) => {
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => crate::log!("editor"; "failed to run `{}`: {}", program, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_until_shutdown() {
        let (tx, rx) = mpsc::channel(4);
        let actor = EditorActor::new(rx, EditorConfig::default(), PathBuf::from("."));
        let handle = tokio::spawn(actor.run());

        tx.send(EditorMsg::Open(SourceLocation::new("src/App.tsx", 1, 1)))
            .await
            .unwrap();
        tx.send(EditorMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn test_missing_program_is_logged_not_fatal() {
        let (_tx, rx) = mpsc::channel(1);
        let editor = EditorConfig {
            command: Some("livepack-no-such-editor {file}".into()),
        };
        let actor = EditorActor::new(rx, editor, std::env::temp_dir());
        actor.open(&SourceLocation::new("a.tsx", 2, 3));
    }
}
