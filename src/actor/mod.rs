//! Actor System for Live Preview
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! FsActor --> DebounceActor --> CompilerActor --> WsActor --> EditorActor
//! (watch)      (quiet period)     (bundle)       (deliver)   (click-to-source)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - Project watcher producing tree snapshots
//! - `debounce` - Re-armable quiet-period timer
//! - `compiler` - Numbered builds on the bundler engine
//! - `ws` - Result ordering and WebSocket delivery
//! - `editor` - Opens clicked source locations
//! - `coordinator` - Wires up and runs actors

pub mod compiler;
pub mod coordinator;
pub mod debounce;
pub mod editor;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
pub use debounce::Debouncer;
