//! # App Hub
//!
//! Discovery and serving of tiny self-contained web apps.
//!
//! An app is any immediate subdirectory of the apps root that contains an
//! `index.html`. An optional `app-metadata.json` next to it overrides the
//! display defaults:
//!
//! ```text
//! tiny_Apps/
//! ├── notes/
//! │   ├── index.html          # required
//! │   ├── app-metadata.json   # optional
//! │   └── script.js
//! └── kanban/
//!     └── index.html
//! ```
//!
//! The registry is rebuilt from disk on every listing, so edits to apps or
//! their metadata show up without a restart.

mod descriptor;
mod registry;

pub use descriptor::{
    AppDescriptor, AppMetadata, DEFAULT_CATEGORY, DEFAULT_COLOR, DEFAULT_DESCRIPTION, DEFAULT_ICON,
};
pub use registry::{
    inject_base_tag, scan_apps, AppRegistry, StaticAsset, ENTRY_FILE, METADATA_FILE,
};
