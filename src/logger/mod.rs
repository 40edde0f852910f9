//! Logger module
//!
//! Provides logging utilities for the site server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Contact mail outcome logging
//! - Error and warning logging
//!
//! Everything goes through `tracing`. Access lines use the `access` target and
//! their own output stream so they can be split from application logs.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing_subscriber::filter::{filter_fn, EnvFilter, FilterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;
use writer::Fallback;

const ACCESS_TARGET: &str = "access";

/// Initialize the logger with configuration
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over `logging.level`.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;

    let access_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer::make_writer(
            config.logging.access_log_file.as_deref(),
            Fallback::Stdout,
        )?)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(filter_fn(|meta| meta.target() == ACCESS_TARGET));

    let app_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer::make_writer(
            config.logging.error_log_file.as_deref(),
            Fallback::Stderr,
        )?)
        .with_target(false)
        .with_filter(level_filter.and(filter_fn(|meta| meta.target() != ACCESS_TARGET)));

    tracing_subscriber::registry()
        .with(access_layer)
        .with(app_layer)
        .try_init()?;
    Ok(())
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Site server started successfully");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Mode: {:?}", config.site.mode);
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.access_log_file {
        tracing::info!("Access log: {path}");
    }
    if let Some(ref path) = config.logging.error_log_file {
        tracing::info!("Error log: {path}");
    }
    if config.mail.recipient().is_none() {
        tracing::warn!("No mail recipient configured (set GMAIL_USER); contact form delivery will fail");
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        tracing::info!("[Headers] Count: {count}");
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_mail_sent(sender_name: &str) {
    tracing::info!("Email sent successfully (from {sender_name})");
}

pub fn log_mail_failed(err: &impl std::fmt::Display) {
    tracing::error!("Error sending email: {err}");
}

pub fn log_shutdown_requested(signal: &str) {
    tracing::info!("[Shutdown] {signal} received, no longer accepting connections");
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        tracing::info!("[Shutdown] All connections closed");
    } else {
        tracing::warn!("[Shutdown] Exiting with {remaining} connection(s) still open");
    }
}
