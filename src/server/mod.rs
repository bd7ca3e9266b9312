// Server module entry point
// Listener creation, per-connection serving, the accept loop and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;
pub mod tree;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::bind_listener;
pub use server_loop::{start_server_loop, ServerLoopConfig};
pub use signal::shutdown_signal;
pub use tree::list_served_files;
