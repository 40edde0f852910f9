// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::{load_templates, AppState};
pub use types::{Config, MailConfig, SiteMode};

/// Unprefixed environment variables the site has always honoured
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    /// `PORT`
    pub port: Option<String>,
    /// `GMAIL_USER`
    pub gmail_user: Option<String>,
    /// `GMAIL_PASS`
    pub gmail_pass: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").ok().filter(|v| !v.is_empty()),
            gmail_user: std::env::var("GMAIL_USER").ok(),
            gmail_pass: std::env::var("GMAIL_PASS").ok(),
        }
    }
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with(config_path, &EnvOverrides::from_env())
    }

    /// Layering, lowest to highest: defaults, config file, `SITE_*` variables,
    /// then `PORT` / `GMAIL_USER` / `GMAIL_PASS`.
    pub fn load_with(
        config_path: &str,
        overrides: &EnvOverrides,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SITE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("site.mode", "full")?
            .set_default("site.template_dir", "templates")?
            .set_default("site.static_dir", "static")?
            .set_default("mail.smtp_host", "smtp.gmail.com")?
            .set_default("mail.smtp_port", 587)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "marketing-site")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_override_option("server.port", overrides.port.clone())?
            .set_override_option("mail.username", overrides.gmail_user.clone())?
            .set_override_option("mail.password", overrides.gmail_pass.clone())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MISSING: &str = "definitely-not-a-config-file";

    #[test]
    fn test_defaults() {
        let cfg = Config::load_with(MISSING, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.site.mode, SiteMode::Full);
        assert_eq!(cfg.site.template_dir, "templates");
        assert_eq!(cfg.mail.smtp_host, "smtp.gmail.com");
        assert_eq!(cfg.mail.smtp_port, 587);
        assert!(cfg.mail.username.is_none());
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.http.max_body_size, 1_048_576);
    }

    #[test]
    fn test_env_overrides() {
        let overrides = EnvOverrides {
            port: Some("8081".to_string()),
            gmail_user: Some("shop@example.com".to_string()),
            gmail_pass: Some("app-password".to_string()),
        };
        let cfg = Config::load_with(MISSING, &overrides).unwrap();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.mail.username.as_deref(), Some("shop@example.com"));
        assert_eq!(cfg.mail.password.as_deref(), Some("app-password"));
        assert_eq!(cfg.mail.recipient(), Some("shop@example.com"));
    }

    #[test]
    fn test_file_source_and_port_precedence() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[site]
mode = "assets"
static_dir = "public"

[mail]
recipient = "inbox@example.com"
"#
        )
        .unwrap();
        let path = file.path().with_extension("");
        let path = path.to_str().unwrap();

        let cfg = Config::load_with(path, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.site.mode, SiteMode::Assets);
        assert_eq!(cfg.site.static_dir, "public");
        assert_eq!(cfg.mail.recipient(), Some("inbox@example.com"));

        let overrides = EnvOverrides {
            port: Some("7000".to_string()),
            ..EnvOverrides::default()
        };
        let cfg = Config::load_with(path, &overrides).unwrap();
        assert_eq!(cfg.server.port, 7000);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::load_with(MISSING, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 5000);

        let mut bad = cfg;
        bad.server.host = "not a host".to_string();
        assert!(bad.get_socket_addr().is_err());
    }
}
