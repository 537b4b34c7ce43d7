use std::time::Duration;

use tungstenite::protocol::Message;

use crate::bundler::BundleResult;
use crate::logger::{status_error, status_success};
use crate::preview::{HostMessage, channel};

use super::WsActor;

impl WsActor {
    /// Tell clients build `seq` started, unless a newer result is already shown
    pub(super) fn announce(&mut self, seq: u64) {
        if !self.gate.is_current(seq) {
            return;
        }
        self.compiling = Some(seq);
        self.broadcast(&HostMessage::Compiling { seq });
    }

    /// Publish the result of build `seq` if it is still the newest
    pub(super) fn deliver(&mut self, seq: u64, result: BundleResult, elapsed: Duration) {
        if !self.gate.accept(seq) {
            crate::debug!("ws"; "discarding stale result #{} (showing #{})", seq, self.gate.shown());
            return;
        }
        if self.compiling.is_some_and(|c| c <= seq) {
            self.compiling = None;
        }

        match &result {
            BundleResult::Code(code) => status_success(&format!(
                "bundle #{} ({:.1} KiB, {}ms)",
                seq,
                code.len() as f64 / 1024.0,
                elapsed.as_millis()
            )),
            BundleResult::Error(error) => status_error(&format!("bundle #{} failed", seq), error),
        }
        crate::core::set_healthy(result.is_code());
        crate::core::set_serving();

        let msg = HostMessage::from_result(seq, &result);
        channel::publish(seq, result);
        self.broadcast(&msg);
    }

    /// Broadcast a message to all connected clients
    pub(super) fn broadcast(&self, msg: &HostMessage) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        let frame = Message::Text(msg.to_json().into());
        clients.retain_mut(|client| client.push(frame.clone()));
        crate::debug!("ws"; "broadcast to {} clients", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::messages::WsMsg;
    use tokio::sync::mpsc;

    fn actor() -> WsActor {
        let (_tx, rx) = mpsc::channel::<WsMsg>(1);
        let (editor_tx, _editor_rx) = mpsc::channel(1);
        WsActor::new(rx, editor_tx)
    }

    #[test]
    fn test_stale_result_is_not_published() {
        let mut ws = actor();
        ws.announce(1);
        ws.announce(2);
        assert_eq!(ws.compiling, Some(2));

        ws.deliver(2, BundleResult::Code("second".into()), Duration::ZERO);
        assert_eq!(ws.gate.shown(), 2);
        assert_eq!(ws.compiling, None);

        ws.deliver(1, BundleResult::Code("first".into()), Duration::ZERO);
        assert_eq!(ws.gate.shown(), 2);

        // announcing an already superseded build is ignored
        ws.announce(1);
        assert_eq!(ws.compiling, None);
    }
}
