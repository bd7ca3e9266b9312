// Connection handling module
// Serves a single TCP connection with hyper's HTTP/1 driver

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::handler::{handle_request, Handler, Resolve};
use crate::logger;

/// Serve one connection to completion.
///
/// Keep-alive is disabled, so the connection closes after its response.
/// With `timeout` set, a connection that takes longer is dropped.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address, recorded in the access log
/// * `handler` - Shared request handler
/// * `timeout` - Upper bound for the whole connection, if any
pub async fn serve_connection<R: Resolve>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<Handler<R>>,
    timeout: Option<Duration>,
) {
    let io = TokioIo::new(stream);

    let mut builder = http1::Builder::new();
    builder.keep_alive(false);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handle_request(req, peer_addr, Arc::clone(&handler))),
    );

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, conn).await {
            Ok(result) => result,
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    limit.as_secs()
                ));
                return;
            }
        },
        None => conn.await,
    };

    if let Err(err) = result {
        // Clients closing early is routine for a dev server
        if !err.is_incomplete_message() {
            logger::log_connection_error(&err);
        }
    }
}
