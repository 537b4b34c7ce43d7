//! livepack - in-memory TSX/JSX bundling with a sandboxed live preview.
//!
//! # Module Structure
//!
//! - `vfs` - Virtual file tree, path index and on-disk project loading
//! - `bundler` - Resolver, source-location injector and the build pipeline
//! - `preview` - Wire protocol and stale-result gate for the preview channel
//! - `actor` - Watch → debounce → compile → deliver actor system
//! - `cli` - Command-line interface and the preview server
//! - `config` - `livepack.toml` handling

#[macro_use]
pub mod logger;

pub mod actor;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod core;
pub mod embed;
pub mod preview;
pub mod utils;
pub mod vfs;
