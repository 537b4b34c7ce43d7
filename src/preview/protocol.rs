//! Preview wire protocol.
//!
//! Two hops carry JSON messages tagged by `type`:
//!
//! - server ↔ host page (websocket): [`HostMessage`] down, [`ClientMessage`] up
//! - host page ↔ sandbox frame (`postMessage`): [`SandboxInbound`] down,
//!   [`SandboxOutbound`] up
//!
//! The host relays sandbox `navigate` and `runtime-error` messages to the
//! server unchanged, so both upward unions share their shapes.

use serde::{Deserialize, Serialize};

use crate::bundler::BundleResult;

/// Server → host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    /// Sent once after the websocket handshake.
    Connected { version: String },

    /// A build with this sequence number has started.
    Compiling { seq: u64 },

    /// Fresh bundle to run in a new sandbox frame.
    Execute { seq: u64, code: String },

    /// Build failed; the last frame stays visible under the error.
    BuildError { seq: u64, error: String },
}

impl HostMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Message delivering the outcome of build `seq`.
    pub fn from_result(seq: u64, result: &BundleResult) -> Self {
        match result {
            BundleResult::Code(code) => Self::Execute {
                seq,
                code: code.clone(),
            },
            BundleResult::Error(error) => Self::BuildError {
                seq,
                error: error.clone(),
            },
        }
    }

    /// Sequence number, if the message belongs to a build.
    pub fn seq(&self) -> Option<u64> {
        match self {
            Self::Connected { .. } => None,
            Self::Compiling { seq } | Self::Execute { seq, .. } | Self::BuildError { seq, .. } => {
                Some(*seq)
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"compiling","seq":0}"#.into())
    }
}

/// Host page → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Element with a source location was clicked (`path:line:column`).
    Navigate { location: String },

    /// Uncaught error inside the sandbox.
    RuntimeError { message: String },
}

impl ClientMessage {
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

/// Host page → sandbox frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SandboxInbound {
    Execute { code: String },
}

/// Sandbox frame → host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SandboxOutbound {
    Navigate { location: String },
    RuntimeError { message: String },
    /// The frame loaded and waits for code.
    Ready,
}

impl SandboxOutbound {
    /// The server-bound form of this message; `Ready` stays on the host.
    pub fn relay(self) -> Option<ClientMessage> {
        match self {
            Self::Navigate { location } => Some(ClientMessage::Navigate { location }),
            Self::RuntimeError { message } => Some(ClientMessage::RuntimeError { message }),
            Self::Ready => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_message_shapes() {
        let msg = HostMessage::Execute {
            seq: 3,
            code: "x()".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "execute", "seq": 3, "code": "x()"})
        );

        let msg = HostMessage::BuildError {
            seq: 4,
            error: "boom".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "build-error", "seq": 4, "error": "boom"})
        );

        let json = HostMessage::connected().to_json();
        assert!(json.starts_with(r#"{"type":"connected","version":"#));
    }

    #[test]
    fn test_from_result() {
        let ok = HostMessage::from_result(1, &BundleResult::Code("c".into()));
        assert_eq!(ok.seq(), Some(1));
        assert!(matches!(ok, HostMessage::Execute { .. }));

        let err = HostMessage::from_result(2, &BundleResult::Error("e".into()));
        assert!(matches!(err, HostMessage::BuildError { seq: 2, .. }));
        assert_eq!(HostMessage::connected().seq(), None);
    }

    #[test]
    fn test_client_message_parse() {
        let msg = ClientMessage::from_json(r#"{"type":"navigate","location":"src/App.tsx:4:7"}"#);
        assert_eq!(
            msg,
            Some(ClientMessage::Navigate {
                location: "src/App.tsx:4:7".into()
            })
        );

        let msg = ClientMessage::from_json(r#"{"type":"runtime-error","message":"x is not defined"}"#);
        assert!(matches!(msg, Some(ClientMessage::RuntimeError { .. })));

        assert!(ClientMessage::from_json(r#"{"type":"ready"}"#).is_none());
        assert!(ClientMessage::from_json("not json").is_none());
    }

    #[test]
    fn test_sandbox_shapes() {
        let inbound = SandboxInbound::Execute { code: "1".into() };
        assert_eq!(
            serde_json::to_value(&inbound).unwrap(),
            json!({"type": "execute", "code": "1"})
        );

        let ready: SandboxOutbound = serde_json::from_str(r#"{"type":"ready"}"#).unwrap();
        assert_eq!(ready, SandboxOutbound::Ready);
        assert_eq!(ready.relay(), None);

        let nav: SandboxOutbound =
            serde_json::from_str(r#"{"type":"navigate","location":"a.tsx:1:2"}"#).unwrap();
        assert_eq!(
            nav.relay(),
            Some(ClientMessage::Navigate {
                location: "a.tsx:1:2".into()
            })
        );
    }
}
