//! MIME type detection module
//!
//! Returns the Content-Type for a file name: explicit overrides first, then the
//! standard extension table from `mime_guess`.

use std::collections::HashMap;
use std::path::Path;

/// Content type always forced for `.js` files
pub const JAVASCRIPT: &str = "application/javascript";

/// Extension to Content-Type table with overrides
///
/// Override keys are matched case-sensitively against the text after the last
/// dot of the file name.
#[derive(Debug, Clone)]
pub struct MimeTypes {
    overrides: HashMap<String, String>,
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeTypes {
    /// Table with the built-in `js` override only
    pub fn new() -> Self {
        let mut overrides = HashMap::new();
        overrides.insert("js".to_string(), JAVASCRIPT.to_string());
        Self { overrides }
    }

    /// Table with extra overrides; `js` stays forced to `application/javascript`
    pub fn with_overrides(extra: &HashMap<String, String>) -> Self {
        let mut types = Self::new();
        for (ext, content_type) in extra {
            let ext = ext.trim_start_matches('.');
            if ext != "js" {
                types.overrides.insert(ext.to_string(), content_type.clone());
            }
        }
        types
    }

    /// Guess the Content-Type of `path`
    ///
    /// # Examples
    /// ```
    /// use devserve::http::mime::MimeTypes;
    /// let types = MimeTypes::new();
    /// assert_eq!(types.content_type("js/app.js"), "application/javascript");
    /// assert_eq!(types.content_type("style.css"), "text/css; charset=utf-8");
    /// assert_eq!(types.content_type("README"), "application/octet-stream");
    /// ```
    pub fn content_type(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        // Unlike `Path::extension`, this treats a bare `.js` name as `js`
        if let Some(forced) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| self.overrides.get(ext))
        {
            return forced.clone();
        }

        let guessed = mime_guess::from_path(path).first_or_octet_stream();
        if guessed.type_() == mime_guess::mime::TEXT && guessed.get_param("charset").is_none() {
            format!("{}; charset=utf-8", guessed.essence_str())
        } else {
            guessed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_is_forced() {
        let types = MimeTypes::new();
        assert_eq!(types.content_type("app.js"), "application/javascript");
        assert_eq!(types.content_type("/srv/chess/stockfish.worker.js"), "application/javascript");
    }

    #[test]
    fn test_js_cannot_be_overridden() {
        let mut extra = HashMap::new();
        extra.insert("js".to_string(), "text/plain".to_string());
        extra.insert(".wasm".to_string(), "application/wasm".to_string());
        let types = MimeTypes::with_overrides(&extra);
        assert_eq!(types.content_type("app.js"), "application/javascript");
        assert_eq!(types.content_type("engine.wasm"), "application/wasm");
    }

    #[test]
    fn test_common_types() {
        let types = MimeTypes::new();
        assert_eq!(types.content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(types.content_type("style.css"), "text/css; charset=utf-8");
        assert_eq!(types.content_type("data.json"), "application/json");
        assert_eq!(types.content_type("board.png"), "image/png");
    }

    #[test]
    fn test_unknown_extension() {
        let types = MimeTypes::new();
        assert_eq!(types.content_type("file.xyzzy"), "application/octet-stream");
        assert_eq!(types.content_type("Makefile"), "application/octet-stream");
    }

    #[test]
    fn test_dotfile_named_js() {
        let types = MimeTypes::new();
        assert_eq!(types.content_type(".js"), JAVASCRIPT);
        assert_eq!(types.content_type("lib/.js"), JAVASCRIPT);
        assert_eq!(types.content_type("engine.min.js"), JAVASCRIPT);
    }

    #[test]
    fn test_override_is_case_sensitive() {
        let types = MimeTypes::new();
        // Falls through to the standard table, which knows JS under some type
        assert_ne!(types.content_type("APP.JS"), "application/octet-stream");
    }
}
