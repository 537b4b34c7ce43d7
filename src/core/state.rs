//! Serve-mode process flags and Ctrl+C handling.
//!
//! The HTTP loop, the actor runtime and the Ctrl+C handler run on
//! different threads and only meet here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::Sender;
use tiny_http::Server;

struct Flags {
    /// A build result has been published
    serving: AtomicBool,
    /// The latest published result is a bundle
    healthy: AtomicBool,
    /// Ctrl+C received
    shutdown: AtomicBool,
}

static FLAGS: Flags = Flags {
    serving: AtomicBool::new(false),
    healthy: AtomicBool::new(false),
    shutdown: AtomicBool::new(false),
};

/// What Ctrl+C has to wake up once the server is running.
struct ShutdownTargets {
    server: Arc<Server>,
    actors: Sender<()>,
}

static TARGETS: OnceLock<ShutdownTargets> = OnceLock::new();

pub fn is_serving() -> bool {
    FLAGS.serving.load(Ordering::SeqCst)
}

pub fn set_serving() {
    FLAGS.serving.store(true, Ordering::SeqCst);
}

pub fn is_healthy() -> bool {
    FLAGS.healthy.load(Ordering::SeqCst)
}

pub fn set_healthy(healthy: bool) {
    FLAGS.healthy.store(healthy, Ordering::SeqCst);
}

pub fn is_shutdown() -> bool {
    FLAGS.shutdown.load(Ordering::Relaxed)
}

/// Install the Ctrl+C handler. Call once, first thing in `main`.
///
/// Before [`register_server`] the process exits at once; afterwards the
/// server is unblocked and the actors are told to stop.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        FLAGS.shutdown.store(true, Ordering::SeqCst);
        match TARGETS.get() {
            Some(targets) => {
                crate::log!("serve"; "shutting down...");
                let _ = targets.actors.send(());
                targets.server.unblock();
            }
            None => std::process::exit(0),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Hand the bound server and the actors' shutdown sender to the Ctrl+C
/// handler. Only the first registration counts.
pub fn register_server(server: Arc<Server>, shutdown_tx: Sender<()>) {
    let _ = TARGETS.set(ShutdownTargets {
        server,
        actors: shutdown_tx,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serving_is_sticky() {
        set_serving();
        assert!(is_serving());
        set_healthy(false);
        assert!(is_serving());
    }

    #[test]
    fn test_healthy_follows_latest() {
        set_healthy(true);
        assert!(is_healthy());
        set_healthy(false);
        assert!(!is_healthy());
    }
}
