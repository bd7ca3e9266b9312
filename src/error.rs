//! Error types
//!
//! `StartupError` covers everything that stops the process before the accept
//! loop runs. `ResolveError` is the per-request result that the handler turns
//! into a status code.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Fatal errors raised during bootstrap; all of them exit with status 1
#[derive(Debug)]
pub enum StartupError {
    Config(config::ConfigError),
    Root { path: PathBuf, source: io::Error },
    Resolve(String),
    Bind { addr: SocketAddr, source: io::Error },
    Runtime(io::Error),
    Logger(io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Root { path, source } => {
                write!(f, "cannot serve directory '{}': {source}", path.display())
            }
            Self::Resolve(msg) => write!(f, "cannot resolve listen address {msg}"),
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::Runtime(e) => write!(f, "failed to build runtime: {e}"),
            Self::Logger(e) => write!(f, "failed to open log file: {e}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Root { source, .. } | Self::Bind { source, .. } => Some(source),
            Self::Runtime(e) | Self::Logger(e) => Some(e),
            Self::Resolve(_) => None,
        }
    }
}

impl From<config::ConfigError> for StartupError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Outcome of a failed path resolution
#[derive(Debug)]
pub enum ResolveError {
    /// Nothing servable at this path (404)
    NotFound,
    /// Target resolves outside the served directory (403)
    Forbidden,
    /// Unexpected failure while reading an existing target (500)
    Internal(io::Error),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("File not found"),
            Self::Forbidden => f.write_str("Access denied"),
            Self::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}
