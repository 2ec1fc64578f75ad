//! Local site server used while crawling.
//!
//! Requests for paths with a file extension are answered from the site
//! root when the file exists. Every other request gets the template, so the
//! app's client-side router can resolve any route before a file for it
//! exists on disk.

use std::fs::File;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::{Error, Result};

/// A running site server; stopped when dropped.
pub struct StaticServer {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    port: u16,
}

impl StaticServer {
    /// Serve `root` on `127.0.0.1:port`, answering non-asset requests with
    /// `template`. Port 0 binds any free port.
    pub fn start(root: impl Into<PathBuf>, template: Arc<String>, port: u16) -> Result<Self> {
        let root = root.into();
        let server = Server::http(("127.0.0.1", port))
            .map_err(|e| Error::ServerError(format!("Failed to bind port {}: {}", port, e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| Error::ServerError("Server is not listening on an IP address".into()))?;

        let server = Arc::new(server);
        let worker = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            for request in worker.incoming_requests() {
                if let Err(e) = respond(&root, &template, request) {
                    warn!("Failed to answer request: {}", e);
                }
            }
        });

        let started = Self {
            server,
            handle: Some(handle),
            port,
        };
        info!("Prerender server started and listening at {}", started.host());
        Ok(started)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Origin the site is served from, without trailing slash.
    pub fn host(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Every spelling of the origin an app may use in absolute links.
    pub fn origins(&self) -> Vec<String> {
        vec![self.host(), format!("http://localhost:{}", self.port)]
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        debug!("Prerender server on port {} stopped", self.port);
    }
}

fn respond(root: &Path, template: &str, request: Request) -> std::io::Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return request.respond(Response::from_string("Method Not Allowed").with_status_code(405));
    }

    let url = request.url().to_string();
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = percent_decode_str(path).decode_utf8_lossy();

    if has_extension(&path) {
        if let Some(file) = asset_path(root, &path) {
            if let Ok(f) = File::open(&file) {
                debug!("GET {} -> {}", url, file.display());
                let response = Response::from_file(f);
                return match content_type_header(content_type(&file)) {
                    Some(header) => request.respond(response.with_header(header)),
                    None => request.respond(response),
                };
            }
        }
    }

    debug!("GET {} -> template", url);
    let response = Response::from_string(template);
    match content_type_header("text/html; charset=utf-8") {
        Some(header) => request.respond(response.with_header(header)),
        None => request.respond(response),
    }
}

fn has_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    Path::new(last).extension().is_some()
}

/// Map a request path onto a regular file under `root`.
fn asset_path(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }
    let file = root.join(relative);
    file.is_file().then_some(file)
}

fn content_type_header(value: &str) -> Option<Header> {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).ok()
}

fn content_type(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "css" => "text/css",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}
