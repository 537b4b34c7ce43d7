//! Preview delivery.
//!
//! # Module Structure
//!
//! ```text
//! preview/
//! ├── protocol.rs  # websocket and postMessage unions
//! └── channel.rs   # ResultGate, latest published result
//! ```
//!
//! The browser half lives in `embed/preview/`: `host.js` owns the
//! websocket and the sandbox frame, `sandbox.js` evaluates bundles and
//! reports clicks and runtime errors.

pub mod channel;
pub mod protocol;

pub use channel::{LatestResult, Published, ResultGate};
pub use protocol::{ClientMessage, HostMessage, SandboxInbound, SandboxOutbound};
