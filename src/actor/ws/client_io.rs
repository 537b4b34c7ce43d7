use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::actor::messages::EditorMsg;
use crate::bundler::SourceLocation;
use crate::preview::{ClientMessage, HostMessage, channel};

use super::{RegisteredClient, WsActor};

/// A client that has not finished its upgrade request by then is dropped.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upgrade an accepted stream. Runs on its own thread, never on the actor.
pub(super) fn handshake(stream: TcpStream) -> anyhow::Result<WebSocket<TcpStream>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
    stream.set_write_timeout(Some(HANDSHAKE_TIMEOUT))?;

    let ws = tungstenite::accept(stream).map_err(|e| anyhow::anyhow!("handshake failed: {e}"))?;

    let stream = ws.get_ref();
    stream.set_read_timeout(None)?;
    stream.set_write_timeout(None)?;
    stream.set_nonblocking(true)?;
    Ok(ws)
}

impl RegisteredClient {
    pub(super) fn new(ws: WebSocket<TcpStream>) -> Self {
        Self { ws, pending: false }
    }

    /// Send `frame`, or leave it queued when the socket buffer is full.
    /// Returns false when the connection is gone.
    pub(super) fn push(&mut self, frame: Message) -> bool {
        let sent = self.ws.send(frame);
        self.settle(sent)
    }

    /// Retry writing queued frames. Returns false when the connection is gone.
    pub(super) fn flush_pending(&mut self) -> bool {
        if !self.pending {
            return true;
        }
        let flushed = self.ws.flush();
        self.settle(flushed)
    }

    fn settle(&mut self, outcome: tungstenite::Result<()>) -> bool {
        match outcome {
            Ok(()) => {
                self.pending = false;
                true
            }
            // the frame stays in tungstenite's write buffer until the next flush
            Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => {
                self.pending = true;
                true
            }
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        }
    }
}

impl WsActor {
    /// Register an upgraded connection and bring it up to date
    pub(super) fn add_client(&self, ws: WebSocket<TcpStream>) {
        let mut client = RegisteredClient::new(ws);

        // Snapshot recovery: connected, last result, then any newer build in flight
        let mut snapshot = vec![HostMessage::connected()];
        if let Some(published) = channel::latest() {
            snapshot.push(HostMessage::from_result(published.seq, &published.result));
        }
        if let Some(seq) = self.compiling.filter(|seq| self.gate.is_current(*seq)) {
            snapshot.push(HostMessage::Compiling { seq });
        }

        for msg in snapshot {
            if !client.push(Message::Text(msg.to_json().into())) {
                return;
            }
        }

        let mut clients = self.clients.lock();
        crate::debug!("ws"; "client connected (total: {})", clients.len() + 1);
        clients.push(client);
    }

    /// Background thread to read client messages (non-blocking poll)
    pub(super) fn client_reader_loop(
        clients: Arc<Mutex<Vec<RegisteredClient>>>,
        editor_tx: mpsc::Sender<EditorMsg>,
    ) {
        while !crate::core::is_shutdown() && !editor_tx.is_closed() {
            std::thread::sleep(std::time::Duration::from_millis(100));

            let mut clients_guard = clients.lock();
            let mut disconnected = Vec::new();

            for (i, client) in clients_guard.iter_mut().enumerate() {
                if !client.flush_pending() {
                    disconnected.push(i);
                    continue;
                }
                // Drain every frame that is ready on this client
                loop {
                    match client.ws.read() {
                        Ok(Message::Text(text)) => Self::handle_client_message(&text, &editor_tx),
                        Ok(Message::Close(_)) => {
                            disconnected.push(i);
                            break;
                        }
                        Ok(_) => {}
                        Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock =>
                        {
                            // No data available
                            break;
                        }
                        Err(_) => {
                            disconnected.push(i);
                            break;
                        }
                    }
                }
            }

            for i in disconnected.into_iter().rev() {
                clients_guard.remove(i);
                crate::debug!("ws"; "client left (total: {})", clients_guard.len());
            }
        }
    }

    fn handle_client_message(text: &str, editor_tx: &mpsc::Sender<EditorMsg>) {
        match ClientMessage::from_json(text) {
            Some(ClientMessage::Navigate { location }) => match location.parse::<SourceLocation>() {
                Ok(location) => {
                    if editor_tx.try_send(EditorMsg::Open(location)).is_err() {
                        crate::debug!("ws"; "editor busy, dropping navigation");
                    }
                }
                Err(e) => crate::debug!("ws"; "{}", e),
            },
            Some(ClientMessage::RuntimeError { message }) => {
                crate::log!("runtime"; "{}", message);
            }
            None => crate::debug!("ws"; "ignoring client message: {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tungstenite::protocol::WebSocketConfig;

    /// Connected (server side, client side) pair on localhost.
    fn connected_pair() -> (RegisteredClient, WebSocket<TcpStream>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let browser = std::thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            let config = WebSocketConfig::default()
                .max_message_size(None)
                .max_frame_size(None);
            let url = format!("ws://{addr}/");
            tungstenite::client::client_with_config(url, stream, Some(config))
                .unwrap()
                .0
        });
        let (stream, _) = listener.accept().unwrap();
        let server = RegisteredClient::new(handshake(stream).unwrap());
        (server, browser.join().unwrap())
    }

    #[test]
    fn test_bundle_larger_than_socket_buffer_is_delivered() {
        let (mut server, mut browser) = connected_pair();

        // far beyond what the kernel buffers while nobody reads
        let bundle = "x".repeat(64 << 20);
        assert!(server.push(Message::Text(bundle.clone().into())));
        assert!(server.pending);

        let reader = std::thread::spawn(move || match browser.read().unwrap() {
            Message::Text(text) => text.as_str().len(),
            other => panic!("unexpected frame: {other:?}"),
        });
        while server.pending {
            assert!(server.flush_pending());
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(reader.join().unwrap(), bundle.len());
    }

    #[test]
    fn test_handshake_rejects_non_websocket_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let peer = std::thread::spawn(move || {
            use std::io::Write;
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        });
        let (stream, _) = listener.accept().unwrap();
        peer.join().unwrap();
        assert!(handshake(stream).is_err());
    }

    #[test]
    fn test_navigate_reaches_editor() {
        let (tx, mut rx) = mpsc::channel(4);
        WsActor::handle_client_message(
            r#"{"type":"navigate","location":"src/App.tsx:12:5"}"#,
            &tx,
        );
        match rx.try_recv() {
            Ok(EditorMsg::Open(loc)) => assert_eq!(loc, SourceLocation::new("src/App.tsx", 12, 5)),
            other => panic!("expected open, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_messages_are_dropped() {
        let (tx, mut rx) = mpsc::channel(4);
        WsActor::handle_client_message(r#"{"type":"navigate","location":"nowhere"}"#, &tx);
        WsActor::handle_client_message(r#"{"type":"runtime-error","message":"x"}"#, &tx);
        WsActor::handle_client_message("garbage", &tx);
        assert!(rx.try_recv().is_err());
    }
}
