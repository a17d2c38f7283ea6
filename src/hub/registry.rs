use super::descriptor::{AppDescriptor, AppMetadata};
use crate::static_files::{content_type_for, resolve_within};
use arc_swap::ArcSwap;
use chrono::Utc;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// File whose presence marks a directory as an app.
pub const ENTRY_FILE: &str = "index.html";
/// Optional per-app metadata overrides.
pub const METADATA_FILE: &str = "app-metadata.json";

/// Bytes and inferred content type of an app asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug)]
struct AppEntry {
    descriptor: AppDescriptor,
    visits: AtomicU64,
}

impl AppEntry {
    fn snapshot(&self) -> AppDescriptor {
        let mut d = self.descriptor.clone();
        d.visit_count = d
            .visit_count
            .saturating_add(self.visits.load(Ordering::Relaxed));
        d
    }
}

/// Discovers apps under a root folder and serves their files.
///
/// Readers load the current snapshot without locking; [`scan`](Self::scan)
/// builds a complete replacement and swaps it in. Visit counters live on
/// the snapshot entries, so a rescan resets them.
pub struct AppRegistry {
    root: PathBuf,
    apps: ArcSwap<Vec<Arc<AppEntry>>>,
}

impl AppRegistry {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            apps: ArcSwap::from_pointee(Vec::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild the registry from disk.
    ///
    /// Never fails: a top-level error is logged and leaves the registry empty.
    pub fn scan(&self) {
        let apps = match scan_apps(&self.root) {
            Ok(apps) => apps,
            Err(err) => {
                warn!(root = %self.root.display(), error = %err, "Error scanning apps");
                Vec::new()
            }
        };
        let entries = apps
            .into_iter()
            .map(|descriptor| {
                Arc::new(AppEntry {
                    descriptor,
                    visits: AtomicU64::new(0),
                })
            })
            .collect::<Vec<_>>();
        self.apps.store(Arc::new(entries));
    }

    /// Rescan and return every descriptor.
    #[must_use]
    pub fn list(&self) -> Vec<AppDescriptor> {
        self.scan();
        self.snapshot()
    }

    /// Descriptors from the last scan, without touching the disk.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AppDescriptor> {
        self.apps.load().iter().map(|e| e.snapshot()).collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<AppDescriptor> {
        self.apps
            .load()
            .iter()
            .find(|e| e.descriptor.path == name)
            .map(|e| e.snapshot())
    }

    /// Count a visit and return the app's entry HTML with a `<base>` tag
    /// pointing at its mount path.
    ///
    /// Returns `None` when the entry file cannot be read.
    #[must_use]
    pub fn visit(&self, name: &str) -> Option<String> {
        let dir = app_dir_name(name)?;
        if let Some(entry) = self.apps.load().iter().find(|e| e.descriptor.path == dir) {
            entry.visits.fetch_add(1, Ordering::Relaxed);
        }

        let path = resolve_within(&self.root.join(dir), ENTRY_FILE)?;
        match fs::read_to_string(&path) {
            Ok(html) => Some(inject_base_tag(&html, dir)),
            Err(err) => {
                debug!(app = %dir, error = %err, "Entry file unreadable");
                None
            }
        }
    }

    /// Read a file inside an app directory.
    ///
    /// Paths that leave the app directory and unreadable files both yield
    /// `None`.
    #[must_use]
    pub fn serve_static(&self, name: &str, relative: &str) -> Option<StaticAsset> {
        let dir = app_dir_name(name)?;
        let base = self.root.join(dir);
        let path = resolve_within(&base, relative)?;
        if !path.is_file() {
            return None;
        }
        match fs::read(&path) {
            Ok(content) => Some(StaticAsset {
                content,
                content_type: content_type_for(&path),
            }),
            Err(err) => {
                debug!(app = %dir, file = %relative, error = %err, "Asset unreadable");
                None
            }
        }
    }
}

/// Walk the immediate subdirectories of `root` and describe every app.
///
/// A missing root is created and yields an empty list. Directories without
/// an entry file and symlinks are skipped; unreadable or malformed metadata falls back to
/// the defaults. Results are ordered by directory name.
///
/// # Errors
///
/// Only failures creating or listing `root` itself.
pub fn scan_apps(root: &Path) -> io::Result<Vec<AppDescriptor>> {
    if !root.exists() {
        info!(root = %root.display(), "Creating apps directory");
        fs::create_dir_all(root)?;
        return Ok(Vec::new());
    }

    let now = Utc::now();
    let mut apps = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };
        // Symlinked directories are not apps.
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let dir = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if !dir.join(ENTRY_FILE).is_file() {
            debug!(dir = %name, "No entry file, not an app");
            continue;
        }

        let defaults = AppDescriptor::with_defaults(&name, now);
        let descriptor = match load_metadata(&dir) {
            Some(meta) => defaults.merge(meta),
            None => defaults,
        };
        info!(app = %name, "Discovered app");
        apps.push(descriptor);
    }
    apps.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(apps)
}

fn load_metadata(dir: &Path) -> Option<AppMetadata> {
    let path = dir.join(METADATA_FILE);
    let raw = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(meta) => Some(meta),
        Err(err) => {
            warn!(file = %path.display(), error = %err, "Ignoring invalid app metadata");
            None
        }
    }
}

/// Accept `name` only when it is a single ordinary path segment.
fn app_dir_name(name: &str) -> Option<&str> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return None;
    }
    let mut comps = Path::new(name).components();
    match (comps.next(), comps.next()) {
        (Some(Component::Normal(_)), None) => Some(name),
        _ => None,
    }
}

fn head_tag() -> &'static Regex {
    static HEAD: OnceLock<Regex> = OnceLock::new();
    HEAD.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"(?i)<head(\s[^>]*)?>").expect("valid head regex")
    })
}

/// Insert `<base href="/app/{name}/">` right after the opening `<head>`.
///
/// Documents without a head element come back unchanged.
#[must_use]
pub fn inject_base_tag(html: &str, name: &str) -> String {
    let Some(m) = head_tag().find(html) else {
        return html.to_string();
    };
    let base = format!("\n    <base href=\"/app/{}/\">", urlencoding::encode(name));
    let mut out = String::with_capacity(html.len() + base.len());
    out.push_str(&html[..m.end()]);
    out.push_str(&base);
    out.push_str(&html[m.end()..]);
    out
}
