//! HTTP response handlers.

use anyhow::Result;
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::config::ProjectConfig;
use crate::embed::preview::{HOST_HTML, HOST_JS, HostVars, SANDBOX_HTML, SandboxVars};
use crate::utils::mime::types::{HTML, JAVASCRIPT, JSON, PLAIN};

/// Respond with the host page bound to `ws_port`.
pub fn respond_host_page(request: Request, ws_port: u16) -> Result<()> {
    let body = HOST_HTML.render(&HostVars { ws_port });
    send_body(request, 200, HTML, body.into_bytes())
}

/// Respond with the host runtime.
pub fn respond_host_js(request: Request) -> Result<()> {
    send_body(request, 200, JAVASCRIPT, HOST_JS.as_bytes().to_vec())
}

/// Respond with the sandbox document.
pub fn respond_sandbox(request: Request, config: &ProjectConfig) -> Result<()> {
    let body = SANDBOX_HTML.render(&SandboxVars {
        source_attribute: config.build.source_attribute.clone(),
        scripts: config.serve.scripts.clone(),
    });
    send_body(request, 200, HTML, body.into_bytes())
}

/// Respond with the latest bundle.
pub fn respond_bundle(request: Request, code: &str) -> Result<()> {
    send_body(request, 200, JAVASCRIPT, code.as_bytes().to_vec())
}

/// Respond with the diagnostics of a failed build (500).
pub fn respond_build_error(request: Request, error: &str) -> Result<()> {
    send_body(request, 500, PLAIN, error.as_bytes().to_vec())
}

/// Respond with a JSON document.
pub fn respond_json<T: Serialize>(request: Request, value: &T) -> Result<()> {
    let body = serde_json::to_vec(value)?;
    send_body(request, 200, JSON, body)
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 405 for anything but GET and HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(request, 405, PLAIN, b"405 Method Not Allowed".to_vec())
}

/// Respond with 503 Service Unavailable (no build yet, or shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    if is_head_request(&request) {
        let response = Response::empty(StatusCode(status))
            .with_header(make_header("Content-Type", content_type));
        request.respond(response)?;
        return Ok(());
    }

    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-store"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).expect("static headers are ASCII")
}
