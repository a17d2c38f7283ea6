//! # CLI Module
//!
//! Command-line entry points for the `apphub` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Start the hub:
//!
//! ```bash
//! apphub serve --addr 127.0.0.1:5000 --apps-dir ./tiny_Apps --database-url sqlite:hub.db
//! ```
//!
//! Options (each overrides the config file and environment):
//! - `--addr <ADDR>` - Listen address
//! - `--apps-dir <DIR>` - Folder scanned for apps
//! - `--frontend-dir <DIR>` - The hub's own front-end
//! - `--no-frontend` - Serve the API and apps only
//! - `--database-url <URL>` - Record store (`memory:`, `kv:FILE`, `sqlite:FILE`)
//!
//! ### `apps`
//!
//! Print the apps a scan would find, as JSON, without starting a server:
//!
//! ```bash
//! apphub apps --apps-dir ./tiny_Apps
//! ```
//!
//! A global `--config <FILE>` loads a YAML [`HubConfig`](crate::config::HubConfig)
//! before the flags are applied.

mod commands;


pub use commands::{build_service, run_cli, Cli, Commands};
