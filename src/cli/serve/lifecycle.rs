//! Binding, the actor thread and shutdown for `livepack serve`.

use crate::{actor::Coordinator, config::ProjectConfig, log};
use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use std::{
    net::{IpAddr, SocketAddr},
    ops::Range,
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tiny_http::Server;

/// Ports tried after the configured one is taken.
const PORT_ATTEMPTS: u16 = 10;

/// How long `serve` waits for the actors after Ctrl+C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn candidate_ports(base: u16) -> Range<u16> {
    base..base.saturating_add(PORT_ATTEMPTS)
}

/// Bind the first free port starting at `base_port`.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for port in candidate_ports(base_port) {
        let wanted = SocketAddr::new(interface, port);
        match Server::http(wanted) {
            Ok(server) => {
                if port != base_port {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(wanted);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    let ports = candidate_ports(base_port);
    Err(anyhow::anyhow!(last_error.unwrap_or_default())).with_context(|| {
        format!(
            "no free port in {}..{} on {}",
            ports.start, ports.end, interface
        )
    })
}

/// Run the actor system on a dedicated thread with its own tokio runtime.
pub fn spawn_actors(
    config: Arc<ProjectConfig>,
    project: PathBuf,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build();
        let runtime = match runtime {
            Ok(rt) => rt,
            Err(e) => {
                log!("actor"; "cannot start runtime: {}", e);
                return;
            }
        };

        let ws_port = config.serve.ws_port;
        let coordinator = Coordinator::with_config(config, project)
            .with_ws_port(ws_port, super::set_actual_ws_port)
            .with_shutdown_signal(shutdown_rx);
        if let Err(e) = runtime.block_on(coordinator.run()) {
            log!("actor"; "error: {:#}", e);
        }
    })
}

/// Join the actor thread if it stops within the grace period.
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    let deadline = Instant::now() + SHUTDOWN_GRACE;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            crate::debug!("actor"; "still running after {:?}, exiting anyway", SHUTDOWN_GRACE);
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    let _ = handle.join();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_bind_with_retry_moves_past_taken_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let taken = std::net::TcpListener::bind((localhost, 0)).unwrap();
        let port = taken.local_addr().unwrap().port();

        let (_server, addr) = bind_with_retry(localhost, port).unwrap();
        assert_ne!(addr.port(), port);
        assert!(candidate_ports(port).contains(&addr.port()));
    }

    #[test]
    fn test_candidate_ports_saturate() {
        assert_eq!(candidate_ports(8000).len(), 10);
        assert!(candidate_ports(u16::MAX - 3).len() < 10);
    }

    #[test]
    fn test_wait_for_finished_thread() {
        let handle = thread::spawn(|| {});
        wait_for_shutdown(handle);
    }
}
