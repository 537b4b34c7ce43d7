//! Actor Message Definitions
//!
//! ```text
//! FsActor --Tree--> DebounceActor --Build--> CompilerActor --Compiling/Result--> WsActor
//!                                                                                  │
//!                                                   EditorActor <--Open(location)--┘
//! ```

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tungstenite::WebSocket;

use crate::bundler::{BundleResult, SourceLocation};
use crate::vfs::FileNode;

/// Immutable tree snapshot moved between actors.
pub type Snapshot = Arc<Vec<FileNode>>;

// =============================================================================
// DebounceActor Messages
// =============================================================================

/// Messages to Debounce Actor
#[derive(Debug)]
pub enum DebounceMsg {
    /// The tree changed; replaces any pending snapshot and restarts the quiet period
    Tree(Snapshot),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// CompilerActor Messages
// =============================================================================

/// Messages to Compiler Actor
#[derive(Debug)]
pub enum CompilerMsg {
    /// Bundle this snapshot
    Build(Snapshot),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Build `seq` has started
    Compiling { seq: u64 },
    /// Build `seq` has finished, possibly after a newer one
    Result {
        seq: u64,
        result: BundleResult,
        elapsed: Duration,
    },
    /// A host page finished its WebSocket upgrade
    AddClient(Box<WebSocket<TcpStream>>),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// EditorActor Messages
// =============================================================================

/// Messages to Editor Actor
#[derive(Debug)]
pub enum EditorMsg {
    /// Open the editor at a clicked element's source
    Open(SourceLocation),
    /// Shutdown
    Shutdown,
}
