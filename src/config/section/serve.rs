//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5277                 # HTTP port number
//! ws_port = 35729             # Preview channel (WebSocket) port
//! debounce_ms = 300           # Quiet period before a rebuild
//! watch = true                # Rebuild on file changes
//! scripts = [                 # Loaded into the sandbox before the bundle
//!     "https://unpkg.com/react@18/umd/react.development.js",
//!     "https://unpkg.com/react-dom@18/umd/react-dom.development.js",
//! ]
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for the preview channel.
    pub ws_port: u16,

    /// Quiet period after the last change before a rebuild starts.
    pub debounce_ms: u64,

    /// Enable file watcher for live rebuilds.
    pub watch: bool,

    /// Script URLs providing the externals' globals.
    pub scripts: Vec<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            ws_port: 35729,
            debounce_ms: 300,
            watch: true,
            scripts: vec![
                "https://unpkg.com/react@18/umd/react.development.js".into(),
                "https://unpkg.com/react-dom@18/umd/react-dom.development.js".into(),
            ],
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.port == self.ws_port {
            errors.push(format!(
                "[serve] port and ws_port must differ (both are {})",
                self.port
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config =
            test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nwatch = false");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 5277);
        assert_eq!(config.serve.ws_port, 35729);
        assert_eq!(config.serve.debounce_ms, 300);
        assert!(config.serve.watch);
        assert_eq!(config.serve.scripts.len(), 2);
    }

    #[test]
    fn test_serve_config_interface_variants() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config = test_parse_config("[serve]\ndebounce_ms = 50\nscripts = []");

        assert_eq!(config.serve.debounce_ms, 50);
        assert!(config.serve.scripts.is_empty());
        // port uses default
        assert_eq!(config.serve.port, 5277);
    }

    #[test]
    fn test_serve_port_clash() {
        let config = test_parse_config("[serve]\nport = 4000\nws_port = 4000");
        let mut errors = Vec::new();
        config.serve.validate(&mut errors);
        assert_eq!(errors.len(), 1);
    }
}
