use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::compiler::CompilerActor;
use crate::actor::debounce::DebounceActor;
use crate::actor::editor::EditorActor;
use crate::actor::fs::FsActor;
use crate::actor::messages::DebounceMsg;
use crate::actor::ws::WsActor;

/// Run all actors concurrently.
///
/// Shutdown flows down the pipeline: the DebounceActor is told first and
/// each actor forwards `Shutdown` to the next before it exits.
pub(super) async fn run_actors(
    fs: Option<FsActor>,
    debounce: DebounceActor,
    compiler: CompilerActor,
    ws: WsActor,
    editor: EditorActor,
    debounce_tx: mpsc::Sender<DebounceMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let editor_handle = tokio::spawn(editor.run());
    let ws_handle = tokio::spawn(ws.run());
    let compiler_handle = tokio::spawn(compiler.run());
    let debounce_handle = tokio::spawn(debounce.run());
    let fs_handle = fs.map(|fs| tokio::spawn(fs.run()));

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = debounce_handle => {}
            _ = compiler_handle => {}
            _ = ws_handle => {}
        }
    }

    if let Some(handle) = fs_handle {
        handle.abort();
    }

    crate::debug!("actor"; "sending shutdown down the pipeline");
    let _ = debounce_tx.send(DebounceMsg::Shutdown).await;

    let _ = tokio::time::timeout(Duration::from_millis(500), editor_handle).await;

    Ok(())
}
