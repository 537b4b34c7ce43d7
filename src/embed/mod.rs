//! Embedded browser resources for the preview server.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `preview` - Host page, sandbox document and their runtimes
//!
//! Scripts are minified by `build.rs` into `OUT_DIR`; the overlay CSS is
//! inlined into the sandbox runtime at the same time. Variables are only
//! substituted into the HTML documents, never into minified code.
//!
//! # Usage
//!
//! ```ignore
//! use embed::preview::{HOST_HTML, HostVars};
//!
//! let html = HOST_HTML.render(&HostVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod preview {
    use super::{Template, TemplateVars};
    use crate::utils::html::escape_attr;

    /// Variables for host.html.
    pub struct HostVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HostVars {
        fn substitute(&self, content: &str) -> String {
            content.replace("__LIVEPACK_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Variables for sandbox.html.
    pub struct SandboxVars {
        /// Attribute the click handler looks for.
        pub source_attribute: String,
        /// Script URLs loaded before any bundle runs.
        pub scripts: Vec<String>,
    }

    impl TemplateVars for SandboxVars {
        fn substitute(&self, content: &str) -> String {
            let scripts: String = self
                .scripts
                .iter()
                .map(|src| format!("<script crossorigin src=\"{}\"></script>\n", escape_attr(src)))
                .collect();
            content
                .replace("<!-- __LIVEPACK_SCRIPTS__ -->", &scripts)
                .replace("__LIVEPACK_SOURCE_ATTR__", &escape_attr(&self.source_attribute))
                .replace("/*__LIVEPACK_SANDBOX_JS__*/", SANDBOX_JS)
        }
    }

    /// Host page: toolbar, status badge, error panel and the sandbox frame.
    pub const HOST_HTML: Template<HostVars> = Template::new(include_str!("preview/host.html"));

    /// Host runtime: WebSocket client and frame management.
    pub const HOST_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/host.min.js"));

    /// Sandbox document loaded into the frame.
    pub const SANDBOX_HTML: Template<SandboxVars> =
        Template::new(include_str!("preview/sandbox.html"));

    /// Sandbox runtime: evaluation, error overlay, click-to-source.
    const SANDBOX_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/sandbox.min.js"));

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_host_page_gets_port() {
            let html = HOST_HTML.render(&HostVars { ws_port: 40001 });
            assert!(html.contains("data-ws-port=\"40001\""));
            assert!(!html.contains("__LIVEPACK_"));
        }

        #[test]
        fn test_sandbox_document() {
            let html = SANDBOX_HTML.render(&SandboxVars {
                source_attribute: "data-loc".into(),
                scripts: vec!["https://example.com/a.js?x=1&y=2".into()],
            });
            assert!(html.contains("src=\"https://example.com/a.js?x=1&amp;y=2\""));
            assert!(html.contains("data-source-attr=\"data-loc\""));
            assert!(html.contains("postMessage"));
            assert!(!html.contains("__LIVEPACK_"));
        }

        #[test]
        fn test_sandbox_attribute_is_escaped() {
            let vars = SandboxVars {
                source_attribute: "data-\"loc\"".into(),
                scripts: Vec::new(),
            };
            let html = vars.substitute("<div data-source-attr=\"__LIVEPACK_SOURCE_ATTR__\">");
            assert_eq!(html, "<div data-source-attr=\"data-&quot;loc&quot;\">");
            // the caller keeps its vars
            assert_eq!(vars.source_attribute, "data-\"loc\"");
        }

        #[test]
        fn test_overlay_css_is_inlined() {
            assert!(!SANDBOX_JS.contains("__LIVEPACK_OVERLAY_CSS__"));
            assert!(SANDBOX_JS.contains("livepack-overlay"));
        }
    }
}
