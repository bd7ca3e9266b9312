//! Request handler module
//!
//! `router` turns requests into responses; `static_files` maps paths onto the
//! served directory.

pub mod router;
pub mod static_files;

pub use router::{handle_request, normalize_path, Handler, ServeOptions, INJECTED_HEADERS};
pub use static_files::{Resolve, Resolved, StaticDirResolver};
