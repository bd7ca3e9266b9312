// Served file listing
// Operator-facing inventory printed at startup; failures never block serving

use std::path::Path;
use walkdir::WalkDir;

use crate::logger;

/// Every file under `root`, as `./relative/path`, sorted by path
///
/// Unreadable entries are reported as warnings and skipped.
pub fn list_served_files(root: &Path) -> Vec<String> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger::log_warning(&format!("Skipping unreadable path while listing files: {e}"));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(format!("./{relative}"));
        }
    }

    files
}
