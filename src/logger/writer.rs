//! Log writer module
//!
//! Resolves where each log stream goes: an append-mode file when a path is
//! configured, otherwise stdout (access log) or stderr (application log).

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Stream used when no file is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Stdout,
    Stderr,
}

/// Build a writer for `tracing_subscriber::fmt` layers
pub fn make_writer(path: Option<&str>, fallback: Fallback) -> io::Result<BoxMakeWriter> {
    Ok(match path {
        Some(p) => BoxMakeWriter::new(Mutex::new(open_log_file(p)?)),
        None => match fallback {
            Fallback::Stdout => BoxMakeWriter::new(io::stdout),
            Fallback::Stderr => BoxMakeWriter::new(io::stderr),
        },
    })
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_log_file_creates_parents_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/nested/access.log");
        let path = path.to_str().unwrap();

        writeln!(open_log_file(path).unwrap(), "first").unwrap();
        writeln!(open_log_file(path).unwrap(), "second").unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_make_writer_fallbacks() {
        assert!(make_writer(None, Fallback::Stdout).is_ok());
        assert!(make_writer(None, Fallback::Stderr).is_ok());
    }
}
