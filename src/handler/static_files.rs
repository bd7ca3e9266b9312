//! Static file resolution module
//!
//! Maps a request path onto the served directory: traversal protection,
//! index documents, trailing-slash redirects and directory listings.

use crate::error::ResolveError;
use crate::http::response::escape_html;
use hyper::body::Bytes;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Index documents tried, in order, when a directory is requested
pub const INDEX_FILES: &[&str] = &["index.html", "index.htm"];

/// What a request path resolved to
#[derive(Debug)]
pub enum Resolved {
    /// A regular file and its content
    File {
        path: PathBuf,
        data: Bytes,
        modified: Option<SystemTime>,
    },
    /// Directory requested without trailing slash
    Redirect { location: String },
    /// Directory without an index document
    Listing { html: String },
}

/// Maps URL paths to content
pub trait Resolve: Send + Sync + 'static {
    /// Resolve `path` (percent-encoded, as received); `query` is only used for redirects
    fn resolve(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> impl Future<Output = Result<Resolved, ResolveError>> + Send;
}

/// Resolver over one directory tree
#[derive(Debug, Clone)]
pub struct StaticDirResolver {
    root: PathBuf,
}

impl StaticDirResolver {
    /// `root` must already be canonical; see `Config::served_directory`
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Reject targets that leave the root through a symlink
    async fn ensure_contained(&self, target: &Path) -> Result<(), ResolveError> {
        let canonical = fs::canonicalize(target).await.map_err(lookup_error)?;
        if canonical.starts_with(&self.root) {
            Ok(())
        } else {
            crate::logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                target.display(),
                canonical.display()
            ));
            Err(ResolveError::Forbidden)
        }
    }
}

impl Resolve for StaticDirResolver {
    async fn resolve(&self, path: &str, query: Option<&str>) -> Result<Resolved, ResolveError> {
        // `//host` in a Location header would be protocol-relative
        let path = format!("/{}", path.trim_start_matches('/'));
        let decoded = urlencoding::decode(&path).map_err(|_| ResolveError::NotFound)?;
        let wants_dir = decoded.ends_with('/');
        let mut target = self.root.join(sanitize_path(&decoded));

        let mut meta = fs::metadata(&target).await.map_err(lookup_error)?;

        if meta.is_dir() {
            if !wants_dir {
                let location = match query {
                    Some(q) => format!("{path}/?{q}"),
                    None => format!("{path}/"),
                };
                return Ok(Resolved::Redirect { location });
            }

            match find_index(&target).await {
                Some((index, index_meta)) => {
                    target = index;
                    meta = index_meta;
                }
                None => {
                    self.ensure_contained(&target).await?;
                    let html = list_directory(&target, &decoded).await?;
                    return Ok(Resolved::Listing { html });
                }
            }
        } else if wants_dir {
            return Err(ResolveError::NotFound);
        }

        self.ensure_contained(&target).await?;

        let data = fs::read(&target).await.map_err(ResolveError::Internal)?;
        Ok(Resolved::File {
            path: target,
            data: Bytes::from(data),
            modified: meta.modified().ok(),
        })
    }
}

/// Turn a decoded URL path into a relative filesystem path
///
/// Empty, `.` and `..` segments are dropped, as are segments carrying a
/// backslash, so the result never climbs above the root.
pub fn sanitize_path(decoded: &str) -> PathBuf {
    decoded
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != ".." && !seg.contains('\\'))
        .collect()
}

/// Missing paths are 404; anything else unexpected is an internal error
fn lookup_error(e: io::Error) -> ResolveError {
    if e.kind() == io::ErrorKind::PermissionDenied {
        ResolveError::Internal(e)
    } else {
        ResolveError::NotFound
    }
}

async fn find_index(dir: &Path) -> Option<(PathBuf, std::fs::Metadata)> {
    for name in INDEX_FILES {
        let candidate = dir.join(name);
        if let Ok(meta) = fs::metadata(&candidate).await {
            if meta.is_file() {
                return Some((candidate, meta));
            }
        }
    }
    None
}

/// Render an HTML listing of `dir`; `display_path` is the decoded request path
async fn list_directory(dir: &Path, display_path: &str) -> Result<String, ResolveError> {
    let mut reader = fs::read_dir(dir).await.map_err(ResolveError::Internal)?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(ResolveError::Internal)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_symlink = entry.file_type().await.is_ok_and(|t| t.is_symlink());
        // Follows symlinks, so a link to a directory lists as a directory
        let is_dir = fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir());
        entries.push((name, is_dir, is_symlink));
    }
    entries.sort_by_key(|(name, _, _)| name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for (name, is_dir, is_symlink) in &entries {
        let mut href = urlencoding::encode(name).into_owned();
        let mut label = name.clone();
        if *is_dir {
            href.push('/');
            label.push('/');
        } else if *is_symlink {
            label.push('@');
        }
        html.push_str(&format!("<li><a href=\"{href}\">{}</a></li>\n", escape_html(&label)));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}
