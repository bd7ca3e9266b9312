//! devserve: a local development HTTP file server.
//!
//! Serves one directory read-only over HTTP/1.x with CORS and cache-busting
//! headers on every response, `application/javascript` for `.js` files, and
//! one flushed access-log line per request.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
