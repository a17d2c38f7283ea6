//! Sandboxed file access shared by the app registry and the hub front-end.
//!
//! Every file the server reads on behalf of a request goes through
//! [`resolve_within`]. A path that escapes its base directory, whether via
//! `..`, an absolute path, or a symlink, resolves to `None` and is reported
//! to the client exactly like a missing file.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Extension → MIME table. Unknown extensions fall back to
/// `application/octet-stream`.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Infer a content type from the file extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Join `relative` onto `base` keeping only normal components.
///
/// Returns `None` as soon as a parent, root or prefix component shows up.
fn map_path(base: &Path, relative: &str) -> Option<PathBuf> {
    let mut pb = base.to_path_buf();
    for comp in Path::new(relative.trim_start_matches('/')).components() {
        match comp {
            Component::Normal(s) => pb.push(s),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(pb)
}

/// Resolve `relative` under `base` and prove the result stays inside `base`.
///
/// Both paths are canonicalized, so the target must exist. Backslashes are
/// treated as separators so `..\\..\\x` is rejected on every platform.
#[must_use]
pub fn resolve_within(base: &Path, relative: &str) -> Option<PathBuf> {
    let normalized = relative.replace('\\', "/");
    let joined = map_path(base, &normalized)?;
    let canonical_base = fs::canonicalize(base).ok()?;
    let canonical = fs::canonicalize(&joined).ok()?;
    if canonical.starts_with(&canonical_base) {
        Some(canonical)
    } else {
        debug!(
            base = %canonical_base.display(),
            resolved = %canonical.display(),
            "Path escapes sandbox"
        );
        None
    }
}

/// A directory of files served verbatim.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Read a file below the base directory together with its content type.
    ///
    /// # Errors
    ///
    /// `NotFound` for missing files, directories and anything outside the
    /// base directory; other I/O errors are passed through.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = resolve_within(&self.base_dir, url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, content_type_for(&path)))
    }
}
