// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub mail: MailConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which server variant to run
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    /// Rendered pages plus the contact form
    #[default]
    Full,
    /// Static assets and a liveness probe only
    Assets,
}

/// Site content configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub mode: SiteMode,
    /// Directory holding the page templates (`index.html`, `about.html`, ...)
    pub template_dir: String,
    /// Directory served as static assets
    pub static_dir: String,
}

/// Outbound mail configuration
#[derive(Deserialize, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// SMTP login, normally taken from `GMAIL_USER`
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password, normally taken from `GMAIL_PASS`
    #[serde(default)]
    pub password: Option<String>,
    /// Mailbox receiving contact messages; falls back to `username`
    #[serde(default)]
    pub recipient: Option<String>,
}

impl MailConfig {
    /// Address contact messages are delivered to
    pub fn recipient(&self) -> Option<&str> {
        self.recipient
            .as_deref()
            .or(self.username.as_deref())
            .filter(|r| !r.trim().is_empty())
    }
}

// Hand-written so the password never lands in a log line
impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

impl PerformanceConfig {
    /// How long a connection may wait for a complete request head: the
    /// keep-alive idle limit, or `read_timeout` when keep-alive is off.
    /// Handler time is not bounded.
    pub const fn header_read_timeout(&self) -> Duration {
        if self.keep_alive_timeout > 0 {
            Duration::from_secs(self.keep_alive_timeout)
        } else {
            Duration::from_secs(self.read_timeout)
        }
    }

    /// Grace period open connections get after shutdown is requested
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(std::cmp::max(self.read_timeout, self.write_timeout))
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(username: Option<&str>, recipient: Option<&str>) -> MailConfig {
        MailConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: username.map(String::from),
            password: Some("hunter2".to_string()),
            recipient: recipient.map(String::from),
        }
    }

    #[test]
    fn test_recipient_falls_back_to_username() {
        assert_eq!(mail(Some("shop@example.com"), None).recipient(), Some("shop@example.com"));
        assert_eq!(
            mail(Some("shop@example.com"), Some("inbox@example.com")).recipient(),
            Some("inbox@example.com")
        );
        assert_eq!(mail(None, None).recipient(), None);
        assert_eq!(mail(Some("  "), None).recipient(), None);
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", mail(Some("shop@example.com"), None));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("********"));
    }

    #[test]
    fn test_shutdown_grace_uses_larger_value() {
        let perf = PerformanceConfig {
            keep_alive_timeout: 75,
            read_timeout: 10,
            write_timeout: 45,
            max_connections: None,
        };
        assert_eq!(perf.shutdown_grace().as_secs(), 45);
    }

    #[test]
    fn test_header_read_timeout_follows_keep_alive() {
        let mut perf = PerformanceConfig {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
        };
        assert_eq!(perf.header_read_timeout().as_secs(), 75);

        perf.keep_alive_timeout = 0;
        assert_eq!(perf.header_read_timeout().as_secs(), 30);
    }
}
