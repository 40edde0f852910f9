//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! route matching, dispatching and access logging.

use crate::config::{AppState, SiteMode};
use crate::handler::pages::{self, Page};
use crate::handler::{contact, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Liveness probe, served in assets mode
pub const HEALTH_PATH: &str = "/health";

/// Request context encapsulating information needed for GET/HEAD processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_entry = state
        .cached_access_log
        .load(Ordering::Relaxed)
        .then(|| {
            AccessLogEntry::from_request(
                remote_addr,
                req.method(),
                req.uri(),
                req.version(),
                req.headers(),
            )
        });

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let mut response = dispatch(req, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route on method first, then path
async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mode = state.mode();
    let accepts_form = mode == SiteMode::Full && Page::from_path(req.uri().path()) == Some(Page::Contact);

    match *req.method() {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext {
                path: req.uri().path(),
                is_head: req.method() == Method::HEAD,
                if_none_match: req
                    .headers()
                    .get("if-none-match")
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string),
            };
            route_get(&ctx, state).await
        }
        Method::POST if accepts_form => {
            if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
                return resp;
            }
            contact::handle_submission(req, state).await
        }
        Method::OPTIONS => http::build_options_response(allowed_methods(accepts_form)),
        _ => {
            logger::log_warning(&format!(
                "Method not allowed: {} {}",
                req.method(),
                req.uri().path()
            ));
            http::build_405_response(allowed_methods(accepts_form))
        }
    }
}

const fn allowed_methods(accepts_form: bool) -> &'static str {
    if accepts_form {
        "GET, HEAD, POST, OPTIONS"
    } else {
        "GET, HEAD, OPTIONS"
    }
}

/// Pages (or the health probe) first, then static assets, then 404
async fn route_get(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match state.mode() {
        SiteMode::Full => {
            if let Some(page) = Page::from_path(ctx.path) {
                return pages::render_page(ctx, page, state.templates.as_ref());
            }
        }
        SiteMode::Assets => {
            if ctx.path == HEALTH_PATH {
                return http::build_json_response(StatusCode::OK, &serde_json::json!({ "ok": true }));
            }
        }
    }

    static_files::serve_asset(ctx, &state.config.site.static_dir).await
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}
