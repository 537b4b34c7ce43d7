//! Compiler Actor
//!
//! Numbers every build and runs it on the engine. Builds are not
//! serialized: a new snapshot starts a new build even while older ones
//! are in flight, and the WsActor drops results that arrive late.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::messages::{CompilerMsg, Snapshot, WsMsg};
use crate::bundler::Engine;

/// Compiler Actor - starts one build per snapshot
pub struct CompilerActor {
    rx: mpsc::Receiver<CompilerMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    engine: &'static Engine,
    /// Sequence number of the last started build
    seq: u64,
}

impl CompilerActor {
    pub fn new(
        rx: mpsc::Receiver<CompilerMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        engine: &'static Engine,
    ) -> Self {
        Self {
            rx,
            ws_tx,
            engine,
            seq: 0,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                CompilerMsg::Build(snapshot) => {
                    if !self.start(snapshot).await {
                        break;
                    }
                }
                CompilerMsg::Shutdown => {
                    crate::debug!("bundle"; "compiler shutting down");
                    let _ = self.ws_tx.send(WsMsg::Shutdown).await;
                    break;
                }
            }
        }
    }

    /// Announce and spawn build `seq + 1`. Returns `false` once the
    /// WsActor is gone.
    async fn start(&mut self, snapshot: Snapshot) -> bool {
        self.seq += 1;
        let seq = self.seq;
        crate::debug!("bundle"; "build #{} ({} top-level nodes)", seq, snapshot.len());

        if self.ws_tx.send(WsMsg::Compiling { seq }).await.is_err() {
            return false;
        }

        let engine = self.engine;
        let ws_tx = self.ws_tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let tree = Arc::unwrap_or_clone(snapshot);
            let result = engine.build(tree).await;
            let elapsed = started.elapsed();
            crate::debug!("bundle"; "build #{} finished in {:?}", seq, elapsed);
            let _ = ws_tx.send(WsMsg::Result { seq, result, elapsed }).await;
        });
        true
    }
}
