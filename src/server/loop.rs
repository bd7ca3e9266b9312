// Server loop module
// Sequential accept loop: each connection is served to completion before the next accept

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::serve_connection;
use crate::handler::{Handler, Resolve};
use crate::logger;

/// Accept loop behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerLoopConfig {
    /// Upper bound for a single connection; `None` waits indefinitely
    pub connection_timeout: Option<Duration>,
}

impl ServerLoopConfig {
    /// Seconds from configuration; 0 disables the limit
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            connection_timeout: if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            },
        }
    }
}

/// Run the accept loop until `shutdown` completes.
///
/// Each connection runs in its own task, which is awaited before the next
/// accept; a panic inside the handler is logged and the loop continues.
/// Shutdown is abrupt: an in-flight connection is abandoned.
pub async fn start_server_loop<R, S>(
    listener: TcpListener,
    handler: Arc<Handler<R>>,
    config: ServerLoopConfig,
    shutdown: S,
) where
    R: Resolve,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            () = &mut shutdown => return,
            accept_result = listener.accept() => match accept_result {
                Ok(accepted) => accepted,
                Err(e) => {
                    logger::log_error(&format!("Failed to accept connection: {e}"));
                    continue;
                }
            },
        };

        let task = tokio::spawn(serve_connection(
            stream,
            peer_addr,
            Arc::clone(&handler),
            config.connection_timeout,
        ));

        tokio::select! {
            () = &mut shutdown => return,
            joined = task => {
                if let Err(e) = joined {
                    logger::log_error(&format!("Connection task from {peer_addr} failed: {e}"));
                }
            }
        }
    }
}
