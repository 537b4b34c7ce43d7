//! WebSocket Actor - Preview Delivery
//!
//! This actor is responsible for:
//! - Managing host page connections
//! - Dropping build results that arrive after a newer one was shown
//! - Broadcasting build state and bundles to all host pages
//! - Receiving click-to-source and runtime error reports
//!
//! # Architecture
//!
//! ```text
//! CompilerActor --[Compiling/Result]--> WsActor --[execute/build-error]--> Host pages
//!                                          ^                                   |
//!                                          +-------[navigate/runtime-error]----+
//!                                          |
//!                         EditorActor <----+
//! ```

mod client_io;
mod delivery;
mod server;

pub use server::start_ws_server_with_channel;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::{EditorMsg, WsMsg};
use crate::preview::ResultGate;

/// A connected host page
struct RegisteredClient {
    ws: WebSocket<TcpStream>,
    /// Frames are waiting in the write buffer for socket space
    pending: bool,
}

/// WebSocket Actor - manages host pages and result ordering
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared for broadcast + read threads)
    clients: Arc<Mutex<Vec<RegisteredClient>>>,
    /// Last-result-wins filter
    gate: ResultGate,
    /// Newest build announced as compiling, replayed to late clients
    compiling: Option<u64>,
    /// Navigation requests from clients
    editor_tx: mpsc::Sender<EditorMsg>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>, editor_tx: mpsc::Sender<EditorMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            gate: ResultGate::new(),
            compiling: None,
            editor_tx,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let editor_tx = self.editor_tx.clone();
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, editor_tx);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Compiling { seq } => self.announce(seq),

                WsMsg::Result {
                    seq,
                    result,
                    elapsed,
                } => self.deliver(seq, result, elapsed),

                WsMsg::AddClient(ws) => self.add_client(*ws),

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    {
                        let mut clients = self.clients.lock();
                        for mut client in clients.drain(..) {
                            let _ = client.ws.close(None);
                        }
                    }
                    let _ = self.editor_tx.send(EditorMsg::Shutdown).await;
                    break;
                }
            }
        }
    }
}
