//! Log-file discovery and retrieval under the configured log path.

use std::path::{Component, Path, PathBuf};

use serde_json::{json, Map, Value};
use walkdir::WalkDir;

/// Collect every log file under `log_path`, keyed `name_N`, with the URL a
/// client can fetch each one from.
pub fn log_file_list(log_path: &Path, base_url: &str) -> Value {
    let mut out = Map::new();
    let mut counter = 0;

    for entry in WalkDir::new(log_path).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !is_log_file_name(&name) {
            continue;
        }

        counter += 1;

        let rel = entry
            .path()
            .strip_prefix(log_path)
            .unwrap_or_else(|_| entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

        out.insert(
            format!("{name}_{counter}"),
            json!({
                "file_name": rel,
                "url": format!("{base_url}/get_log_file?log_file={rel}"),
                "file_size": format!("{size} bytes"),
            }),
        );
    }

    Value::Object(out)
}

/// A valid name is `*.log` or a numbered rotation of one (`*.log.1`).
pub fn is_log_file_name(name: &str) -> bool {
    if name.ends_with(".log") {
        return true;
    }

    match name.rsplit_once('.') {
        Some((stem, suffix)) => {
            stem.ends_with(".log")
                && !suffix.is_empty()
                && suffix.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// True when `requested` is a plain relative path that cannot escape the
/// log directory.
pub fn is_safe_relative_path(requested: &str) -> bool {
    let path = Path::new(requested);
    !requested.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Resolve a requested log file against the log directory. `None` when the
/// file does not exist; invalid names must be rejected before calling this.
pub fn resolve_log_file(log_path: &Path, requested: &str) -> Option<PathBuf> {
    let candidate = log_path.join(requested);
    candidate.is_file().then_some(candidate)
}
