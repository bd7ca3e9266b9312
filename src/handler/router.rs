//! Request dispatch module
//!
//! Entry point for HTTP request processing: method check, root rewrite,
//! resolution, error translation, header injection and access logging.

use crate::config::Config;
use crate::error::ResolveError;
use crate::handler::static_files::{Resolve, Resolved};
use crate::http::{self, cache, MimeTypes};
use crate::logger::{self, AccessLogEntry, LogSink, NullSink};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Headers appended to every response
pub const INJECTED_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET"),
    ("cache-control", "no-store, no-cache, must-revalidate"),
];

/// Extension points of the request handler
#[derive(Clone)]
pub struct ServeOptions {
    /// Appended last, replacing any header of the same name
    pub extra_headers: Vec<(HeaderName, HeaderValue)>,
    pub mime_types: MimeTypes,
    pub log_sink: Arc<dyn LogSink>,
    pub log_format: String,
    pub server_name: String,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            extra_headers: injected_headers(),
            mime_types: MimeTypes::new(),
            log_sink: Arc::new(NullSink),
            log_format: "dev".to_string(),
            server_name: concat!("devserve/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ServeOptions {
    /// Build options from configuration, writing access lines to `log_sink`
    ///
    /// Configured extra headers with invalid names or values are skipped with a warning.
    pub fn from_config(config: &Config, log_sink: Arc<dyn LogSink>) -> Self {
        let mut extra_headers = injected_headers();
        let mut configured: Vec<_> = config.http.extra_headers.iter().collect();
        configured.sort();
        for (name, value) in configured {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => extra_headers.push((name, value)),
                _ => logger::log_warning(&format!("Ignoring invalid extra header '{name}: {value}'")),
            }
        }

        let log_sink = if config.logging.access_log {
            log_sink
        } else {
            Arc::new(NullSink)
        };

        Self {
            extra_headers,
            mime_types: MimeTypes::with_overrides(&config.http.mime_overrides),
            log_sink,
            log_format: config.logging.access_log_format.clone(),
            server_name: config.http.server_name.clone(),
        }
    }
}

fn injected_headers() -> Vec<(HeaderName, HeaderValue)> {
    INJECTED_HEADERS
        .iter()
        .map(|(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
        .collect()
}

/// Resolver plus options; shared by every connection
pub struct Handler<R> {
    pub resolver: R,
    pub options: ServeOptions,
}

impl<R: Resolve> Handler<R> {
    pub const fn new(resolver: R, options: ServeOptions) -> Self {
        Self { resolver, options }
    }
}

/// Request context encapsulating information needed for request processing
struct RequestContext<'a> {
    method: &'a Method,
    path: &'a str,
    query: Option<&'a str>,
    headers: &'a HeaderMap,
    is_head: bool,
}

/// Main entry point for HTTP request handling
///
/// Never fails: every outcome, including internal errors, becomes a response.
pub async fn handle_request<B, R: Resolve>(
    req: Request<B>,
    peer: SocketAddr,
    handler: Arc<Handler<R>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let mut entry = AccessLogEntry::new(
        peer.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.referer = header_string(&parts.headers, "referer");
    entry.user_agent = header_string(&parts.headers, "user-agent");

    let ctx = RequestContext {
        method: &parts.method,
        path: normalize_path(parts.uri.path()),
        query: parts.uri.query(),
        headers: &parts.headers,
        is_head: parts.method == Method::HEAD,
    };

    let mut response = dispatch(&ctx, &handler).await;
    finalize_headers(&mut response, &handler.options);

    entry.status = response.status().as_u16();
    entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
        .unwrap_or(usize::MAX);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    handler
        .options
        .log_sink
        .write_line(&entry.format(&handler.options.log_format));

    Ok(response)
}

/// `/` is served as `/index.html`; every other path is left untouched
pub fn normalize_path(path: &str) -> &str {
    if path == "/" {
        "/index.html"
    } else {
        path
    }
}

async fn dispatch<R: Resolve>(ctx: &RequestContext<'_>, handler: &Handler<R>) -> Response<Full<Bytes>> {
    if !matches!(*ctx.method, Method::GET | Method::HEAD) {
        return http::build_501_response(ctx.method);
    }

    match handler.resolver.resolve(ctx.path, ctx.query).await {
        Ok(resolved) => build_resolved_response(ctx, resolved, &handler.options.mime_types),
        Err(err) => error_response(&err, ctx.is_head),
    }
}

fn build_resolved_response(
    ctx: &RequestContext<'_>,
    resolved: Resolved,
    mime_types: &MimeTypes,
) -> Response<Full<Bytes>> {
    match resolved {
        Resolved::File {
            path,
            data,
            modified,
        } => {
            let last_modified = modified.map(cache::format_http_date);
            if cache::is_not_modified(
                header_str(ctx.headers, "if-modified-since"),
                header_str(ctx.headers, "if-none-match"),
                modified,
            ) {
                return http::build_304_response(last_modified.as_deref());
            }
            let content_type = mime_types.content_type(&path);
            http::build_file_response(data, &content_type, last_modified.as_deref(), ctx.is_head)
        }
        Resolved::Redirect { location } => http::build_redirect_response(&location),
        Resolved::Listing { html } => http::build_html_response(html, ctx.is_head),
    }
}

/// Error boundary: internal failures are reported and become a 500
fn error_response(err: &ResolveError, is_head: bool) -> Response<Full<Bytes>> {
    match err {
        ResolveError::Internal(_) => {
            logger::log_request_failure(err);
            http::build_500_response(&err.to_string(), is_head)
        }
        ResolveError::NotFound => http::build_404_response(is_head),
        ResolveError::Forbidden => {
            http::build_error_response(StatusCode::FORBIDDEN, &err.to_string(), is_head)
        }
    }
}

/// Default headers first, then the configured ones, each replacing same-named values
fn finalize_headers(response: &mut Response<Full<Bytes>>, options: &ServeOptions) {
    let headers = response.headers_mut();
    if let Ok(server) = HeaderValue::try_from(options.server_name.as_str()) {
        headers.insert(hyper::header::SERVER, server);
    }
    if let Ok(date) = HeaderValue::try_from(cache::http_date_now()) {
        headers.insert(hyper::header::DATE, date);
    }
    headers.insert(hyper::header::CONNECTION, HeaderValue::from_static("close"));
    for (name, value) in &options.extra_headers {
        headers.insert(name.clone(), value.clone());
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    header_str(headers, name).map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::static_files::StaticDirResolver;
    use crate::logger::MemorySink;
    use http_body_util::BodyExt;
    use std::io;
    use tempfile::TempDir;

    /// Resolver that fails every lookup with an I/O error
    struct FailingResolver;

    impl Resolve for FailingResolver {
        async fn resolve(&self, _path: &str, _query: Option<&str>) -> Result<Resolved, ResolveError> {
            Err(ResolveError::Internal(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "Permission denied (os error 13)",
            )))
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:54321".parse().unwrap()
    }

    fn get(path: &str) -> Request<()> {
        Request::builder().uri(path).body(()).unwrap()
    }

    fn setup() -> (TempDir, Arc<Handler<StaticDirResolver>>, MemorySink) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>chess</h1>").unwrap();
        std::fs::write(dir.path().join("app.js"), "let x = 1;").unwrap();
        std::fs::write(dir.path().join("style.css"), "body{}").unwrap();
        let sink = MemorySink::new();
        let options = ServeOptions {
            log_sink: Arc::new(sink.clone()),
            ..ServeOptions::default()
        };
        let resolver = StaticDirResolver::new(dir.path().canonicalize().unwrap());
        (dir, Arc::new(Handler::new(resolver, options)), sink)
    }

    async fn send<R: Resolve>(handler: &Arc<Handler<R>>, req: Request<()>) -> Response<Full<Bytes>> {
        handle_request(req, peer(), Arc::clone(handler)).await.unwrap()
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    fn assert_injected(resp: &Response<Full<Bytes>>) {
        let headers = resp.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET");
        assert_eq!(headers["cache-control"], "no-store, no-cache, must-revalidate");
        assert_eq!(headers.get_all("cache-control").iter().count(), 1);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/index.html");
        assert_eq!(normalize_path("/app.js"), "/app.js");
        assert_eq!(normalize_path("/sub/"), "/sub/");
        assert_eq!(normalize_path(""), "");
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let (_dir, handler, _sink) = setup();
        let root = send(&handler, get("/")).await;
        assert_eq!(root.status(), 200);
        assert_injected(&root);
        assert_eq!(root.headers()["content-type"], "text/html; charset=utf-8");
        let index = send(&handler, get("/index.html")).await;
        assert_eq!(body_bytes(root).await, body_bytes(index).await);
    }

    #[tokio::test]
    async fn test_js_content_type() {
        let (_dir, handler, _sink) = setup();
        let resp = send(&handler, get("/app.js")).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "application/javascript");
        assert_injected(&resp);
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"let x = 1;"));
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_headers() {
        let (_dir, handler, _sink) = setup();
        let resp = send(&handler, get("/missing.png")).await;
        assert_eq!(resp.status(), 404);
        assert_injected(&resp);
        assert!(String::from_utf8_lossy(&body_bytes(resp).await).contains("File not found"));
    }

    #[tokio::test]
    async fn test_internal_error_becomes_500() {
        let sink = MemorySink::new();
        let options = ServeOptions {
            log_sink: Arc::new(sink.clone()),
            ..ServeOptions::default()
        };
        let handler = Arc::new(Handler::new(FailingResolver, options));
        let resp = send(&handler, get("/index.html")).await;
        assert_eq!(resp.status(), 500);
        assert_injected(&resp);
        let body = body_bytes(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("Server error: Permission denied (os error 13)"));

        // The handler keeps serving after a failure
        let again = send(&handler, get("/app.js")).await;
        assert_eq!(again.status(), 500);
        assert_eq!(sink.lines().len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_501() {
        let (_dir, handler, _sink) = setup();
        let req = Request::builder().method(Method::POST).uri("/").body(()).unwrap();
        let resp = send(&handler, req).await;
        assert_eq!(resp.status(), 501);
        assert_injected(&resp);
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (_dir, handler, _sink) = setup();
        let req = Request::builder().method(Method::HEAD).uri("/style.css").body(()).unwrap();
        let resp = send(&handler, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "6");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_if_modified_since_gives_304() {
        let (_dir, handler, _sink) = setup();
        let first = send(&handler, get("/style.css")).await;
        let last_modified = first.headers()["last-modified"].to_str().unwrap().to_string();

        let req = Request::builder()
            .uri("/style.css")
            .header("If-Modified-Since", last_modified)
            .body(())
            .unwrap();
        let resp = send(&handler, req).await;
        assert_eq!(resp.status(), 304);
        assert_injected(&resp);
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_one_log_line_per_request() {
        let (_dir, handler, sink) = setup();
        send(&handler, get("/")).await;
        send(&handler, get("/missing.png?x=1")).await;
        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("127.0.0.1 - ["));
        assert!(lines[0].ends_with("\"GET / HTTP/1.1\" 200 14"));
        assert!(lines[1].contains("\"GET /missing.png?x=1 HTTP/1.1\" 404 "));
    }

    #[tokio::test]
    async fn test_extra_headers_from_config() {
        let (dir, _handler, _sink) = setup();
        let mut config = Config::load_from("/nonexistent/devserve-test-config", &Default::default()).unwrap();
        config.http.extra_headers.insert("x-dev-server".to_string(), "1".to_string());
        config.http.extra_headers.insert("bad header".to_string(), "x".to_string());
        config.http.mime_overrides.insert("css".to_string(), "text/x-test".to_string());
        let options = ServeOptions::from_config(&config, Arc::new(MemorySink::new()));
        let resolver = StaticDirResolver::new(dir.path().canonicalize().unwrap());
        let handler = Arc::new(Handler::new(resolver, options));

        let resp = send(&handler, get("/style.css")).await;
        assert_eq!(resp.headers()["x-dev-server"], "1");
        assert_eq!(resp.headers()["content-type"], "text/x-test");
        assert_injected(&resp);
    }

    #[tokio::test]
    async fn test_access_log_disabled() {
        let (dir, _handler, _sink) = setup();
        let mut config = Config::load_from("/nonexistent/devserve-test-config", &Default::default()).unwrap();
        config.logging.access_log = false;
        let sink = MemorySink::new();
        let options = ServeOptions::from_config(&config, Arc::new(sink.clone()));
        let resolver = StaticDirResolver::new(dir.path().canonicalize().unwrap());
        let handler = Arc::new(Handler::new(resolver, options));

        send(&handler, get("/")).await;
        assert!(sink.lines().is_empty());
    }
}
