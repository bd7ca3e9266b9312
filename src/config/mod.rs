// Configuration module entry point
// Loads layered configuration and resolves the served directory

mod types;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

use crate::error::StartupError;

/// Default config file name (without extension), looked up next to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "devserve";

/// Values given on the command line; they win over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<String>,
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the optional file,
    /// `DEVSERVE_*` environment variables (`__` separates sections), `overrides`.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "localhost")?
            .set_default("server.port", 8000)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "dev")?
            .set_default("logging.list_files", true)?
            .set_default("http.server_name", concat!("devserve/", env!("CARGO_PKG_VERSION")))?
            .set_default("performance.connection_timeout", 0)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DEVSERVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("server.root", overrides.root.clone())?
            .build()?;

        settings.try_deserialize()
    }

    /// Resolve `host:port` to the first socket address; `localhost` is allowed
    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let target = format!("{}:{}", self.server.host, self.server.port);
        (self.server.host.as_str(), self.server.port)
            .to_socket_addrs()
            .map_err(|e| StartupError::Resolve(format!("{target}: {e}")))?
            .next()
            .ok_or_else(|| StartupError::Resolve(format!("{target}: no addresses found")))
    }

    /// URL operators should open in a browser
    pub fn display_url(&self) -> String {
        format!("http://{}:{}/", self.server.host, self.server.port)
    }

    /// Resolve the served directory to an absolute canonical path
    pub fn served_directory(&self) -> Result<PathBuf, StartupError> {
        let dir = match &self.server.root {
            Some(root) => PathBuf::from(root),
            None => executable_dir()?,
        };
        canonical_dir(&dir)
    }
}

fn executable_dir() -> Result<PathBuf, StartupError> {
    let exe = std::env::current_exe().map_err(|e| StartupError::Root {
        path: PathBuf::from("<current executable>"),
        source: e,
    })?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| StartupError::Root {
        path: exe.clone(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "executable has no parent directory"),
    })
}

fn canonical_dir(dir: &Path) -> Result<PathBuf, StartupError> {
    let canonical = dir.canonicalize().map_err(|e| StartupError::Root {
        path: dir.to_path_buf(),
        source: e,
    })?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(StartupError::Root {
            path: canonical,
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_defaults() -> Config {
        Config::load_from("/nonexistent/devserve-test-config", &Overrides::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = load_defaults();
        assert_eq!(cfg.server.host, "localhost");
        assert_eq!(cfg.server.port, 8000);
        assert!(cfg.server.root.is_none());
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "dev");
        assert!(cfg.logging.list_files);
        assert_eq!(cfg.performance.connection_timeout, 0);
        assert!(cfg.http.mime_overrides.is_empty());
        assert_eq!(cfg.display_url(), "http://localhost:8000/");
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(9123),
            root: Some("/tmp".to_string()),
        };
        let cfg = Config::load_from("/nonexistent/devserve-test-config", &overrides).unwrap();
        assert_eq!(cfg.server.port, 9123);
        assert_eq!(cfg.server.root.as_deref(), Some("/tmp"));
        assert_eq!(cfg.get_socket_addr().unwrap(), "127.0.0.1:9123".parse().unwrap());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serve.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8123\n\n[http.mime_overrides]\nwasm = \"application/wasm\"\n",
        )
        .unwrap();
        let stem = dir.path().join("serve");
        let cfg = Config::load_from(stem.to_str().unwrap(), &Overrides::default()).unwrap();
        assert_eq!(cfg.server.port, 8123);
        assert_eq!(
            cfg.http.mime_overrides.get("wasm").map(String::as_str),
            Some("application/wasm")
        );
    }

    #[test]
    fn test_served_directory_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir(&nested).unwrap();
        let mut cfg = load_defaults();
        cfg.server.root = Some(nested.join("..").join("a").to_string_lossy().into_owned());
        assert_eq!(cfg.served_directory().unwrap(), nested.canonicalize().unwrap());
    }

    #[test]
    fn test_served_directory_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "x").unwrap();
        let mut cfg = load_defaults();
        cfg.server.root = Some(file.to_string_lossy().into_owned());
        assert!(matches!(cfg.served_directory(), Err(StartupError::Root { .. })));
    }

    #[test]
    fn test_served_directory_defaults_to_executable_dir() {
        let cfg = load_defaults();
        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().canonicalize().unwrap();
        assert_eq!(cfg.served_directory().unwrap(), exe_dir);
    }
}
