//! Logger module
//!
//! Provides logging utilities for the dev server including:
//! - Startup banner and served file listing
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Destination for access log lines
///
/// The request handler writes through this instead of the global writer so
/// embedders and tests can capture the lines.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Sink backed by the global log writer (stdout or the access log file)
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalSink;

impl LogSink for GlobalSink {
    fn write_line(&self, line: &str) {
        write_access(line);
    }
}

/// Sink that discards everything; used when access logging is off
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write_line(&self, _line: &str) {}
}

/// In-memory sink collecting every line
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Write to info log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => writer::write_line(&mut std::io::stdout().lock(), message),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => writer::write_line(&mut std::io::stdout().lock(), message),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => writer::write_line(&mut std::io::stdout().lock(), message),
    }
}

pub fn log_root_directory(root: &Path) {
    write_info(&format!("Server root directory: {}", root.display()));
}

/// Print the served files, one per line, relative to the root
pub fn log_served_files(files: &[String]) {
    write_info("\nFiles available in server directory:");
    for file in files {
        write_info(&format!("  {file}"));
    }
}

pub fn log_server_start(config: &Config) {
    for line in server_start_banner(config) {
        write_info(&line);
    }
}

/// Lines printed once the listener is bound
pub fn server_start_banner(config: &Config) -> Vec<String> {
    let url = config.display_url();
    let mut lines = vec![
        format!("\nServer running at {url}"),
        format!("Chess application available at {url}"),
    ];
    if let Some(ref path) = config.logging.access_log_file {
        lines.push(format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        lines.push(format!("Error log: {path}"));
    }
    lines.push("Press Ctrl+C to stop the server".to_string());
    lines
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("\n[SIGNAL] {signal} received, shutting down"));
}

pub fn log_startup_failure(err: &dyn std::error::Error) {
    write_error(&format!("Error starting server: {err}"));
}

pub fn log_request_failure(err: &dyn std::error::Error) {
    write_error(&format!("Error handling request: {err}"));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_lines() {
        let sink = MemorySink::new();
        let shared: Arc<dyn LogSink> = Arc::new(sink.clone());
        shared.write_line("one");
        shared.write_line("two");
        assert_eq!(sink.lines(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_null_sink_is_silent() {
        NullSink.write_line("ignored");
    }

    #[test]
    fn test_server_start_banner() {
        let overrides = crate::config::Overrides {
            port: Some(8123),
            ..Default::default()
        };
        let config = Config::load_from("/nonexistent/devserve-banner", &overrides).unwrap();
        assert_eq!(
            server_start_banner(&config),
            vec![
                "\nServer running at http://localhost:8123/".to_string(),
                "Chess application available at http://localhost:8123/".to_string(),
                "Press Ctrl+C to stop the server".to_string(),
            ]
        );
    }
}
