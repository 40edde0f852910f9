// Application state module
// Read-only state shared by every request

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tera::Tera;
use thiserror::Error;

use super::types::{Config, SiteMode};
use crate::mail::{MailDispatcher, MailError, SmtpDispatcher};

/// Failures while assembling the state at startup
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to load templates from '{dir}': {source}")]
    Templates {
        dir: String,
        #[source]
        source: tera::Error,
    },

    #[error("failed to configure mail transport: {0}")]
    Mail(#[from] MailError),
}

/// Application state
pub struct AppState {
    pub config: Config,
    /// Compiled page templates; `None` in assets mode
    pub templates: Option<Tera>,
    /// Outbound mail collaborator for the contact form
    pub mailer: Arc<dyn MailDispatcher>,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, templates: Option<Tera>, mailer: Arc<dyn MailDispatcher>) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            templates,
            mailer,
            cached_access_log,
        }
    }

    /// Build the production state: templates from disk, SMTP dispatcher
    pub fn from_config(config: Config) -> Result<Self, SetupError> {
        let templates = match config.site.mode {
            SiteMode::Full => Some(load_templates(&config.site.template_dir)?),
            SiteMode::Assets => None,
        };
        let mailer: Arc<dyn MailDispatcher> = Arc::new(SmtpDispatcher::new(&config.mail)?);
        Ok(Self::new(config, templates, mailer))
    }

    pub fn mode(&self) -> SiteMode {
        self.config.site.mode
    }
}

/// Compile every `*.html` under `dir`
pub fn load_templates(dir: &str) -> Result<Tera, SetupError> {
    let glob = Path::new(dir).join("**").join("*.html");
    Tera::new(&glob.to_string_lossy()).map_err(|source| SetupError::Templates {
        dir: dir.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_templates_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>{{ page }}</h1>").unwrap();
        fs::write(dir.path().join("about.html"), "<h1>About</h1>").unwrap();

        let tera = load_templates(dir.path().to_str().unwrap()).unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"index.html"));
        assert!(names.contains(&"about.html"));
    }

    #[test]
    fn test_load_templates_reports_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.html"), "{% if %}").unwrap();

        let err = load_templates(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SetupError::Templates { .. }));
    }
}
