//! HTTP protocol layer module
//!
//! Content-type inference, HTTP dates and conditional requests, and response
//! builders. Nothing here touches the filesystem.

pub mod cache;
pub mod mime;
pub mod response;

pub use mime::MimeTypes;
pub use response::{
    build_304_response, build_404_response, build_500_response, build_501_response,
    build_error_response, build_file_response, build_html_response, build_redirect_response,
};
