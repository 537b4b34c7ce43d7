//! Development server for live previews.
//!
//! # Routes
//!
//! | Path                      | Content                                  |
//! |---------------------------|------------------------------------------|
//! | `/`                       | host page (toolbar, badge, sandbox frame)|
//! | `/__livepack/host.js`     | host runtime with the WebSocket port     |
//! | `/__livepack/sandbox.html`| sandbox document loaded into the frame   |
//! | `/__livepack/bundle.js`   | latest successful bundle                 |
//! | `/__livepack/status`      | engine and build state as JSON           |

mod lifecycle;
mod response;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use anyhow::Result;
use crossbeam::channel;
use serde::Serialize;
use tiny_http::{Method, Request, Server};

use crate::config::{ProjectConfig, cfg};
use crate::preview::channel as published;
use crate::{debug, log};

/// Actual WebSocket port (may differ from the configured one if it was in use)
/// Updated by the coordinator after the WebSocket server binds
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Get the actual WebSocket port, falling back to the configured one
fn get_actual_ws_port(config: &ProjectConfig) -> u16 {
    match ACTUAL_WS_PORT.load(Ordering::Relaxed) {
        0 => config.serve.ws_port,
        port => port,
    }
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    project: PathBuf,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop
///
/// Requests arriving before the first build finishes get the host page,
/// which shows the compiling badge until a result is pushed.
pub fn bind_server(project: PathBuf) -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    Ok(BoundServer {
        server,
        addr,
        project,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the actors and the request loop (blocking).
    pub fn run(self) -> Result<()> {
        log!("serve"; "http://{}", self.addr());
        let config = cfg();
        let actor_handle =
            lifecycle::spawn_actors(Arc::clone(&config), self.project, self.shutdown_rx);
        run_request_loop(&self.server)?;
        lifecycle::wait_for_shutdown(actor_handle);
        Ok(())
    }
}

fn run_request_loop(server: &Server) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create request pool: {}", e))?;

    for request in server.incoming_requests() {
        let config = cfg();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &ProjectConfig) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }
    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    let path = request.url().split(['?', '#']).next().unwrap_or("/").to_string();
    debug!("serve"; "{} {}", request.method(), path);

    match path.as_str() {
        "/" | "/index.html" => response::respond_host_page(request, get_actual_ws_port(config)),
        "/__livepack/host.js" => response::respond_host_js(request),
        "/__livepack/sandbox.html" => response::respond_sandbox(request, config),
        "/__livepack/bundle.js" => match published::latest() {
            Some(latest) => match latest.result.code() {
                Some(code) => response::respond_bundle(request, code),
                None => response::respond_build_error(request, latest.result.error().unwrap_or_default()),
            },
            None => response::respond_unavailable(request),
        },
        "/__livepack/status" => response::respond_json(request, &Status::current()),
        _ => response::respond_not_found(request),
    }
}

/// Body of `/__livepack/status`.
#[derive(Debug, Serialize)]
struct Status {
    engine: &'static str,
    serving: bool,
    healthy: bool,
    seq: Option<u64>,
}

impl Status {
    fn current() -> Self {
        use crate::bundler::EngineState;

        Self {
            engine: match crate::bundler::engine::state() {
                EngineState::Uninitialized => "uninitialized",
                EngineState::Initializing => "initializing",
                EngineState::Ready => "ready",
            },
            serving: crate::core::is_serving(),
            healthy: crate::core::is_healthy(),
            seq: published::latest().map(|p| p.seq),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;

    #[test]
    fn test_bound_address_accepts_connections() {
        let bound = bind_server(PathBuf::from(".")).unwrap();
        let addr = bound.addr();
        assert_ne!(addr.port(), 0);
        TcpStream::connect(addr).unwrap();
    }
}
