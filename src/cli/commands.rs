use crate::config::HubConfig;
use crate::hub::{scan_apps, AppRegistry};
use crate::middleware::{CorsMiddleware, TracingMiddleware};
use crate::router::Router;
use crate::server::{AppService, AppState, HttpServer, ServerHandle};
use crate::static_files::StaticFiles;
use crate::store::{open_store, RecordStore};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line interface for the app hub
#[derive(Parser, Debug)]
#[command(name = "apphub", version)]
#[command(about = "Serve a folder of tiny web apps with their backing APIs", long_about = None)]
pub struct Cli {
    /// YAML configuration file, applied before environment variables
    #[arg(short, long, global = true, env = "APPHUB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the hub server
    Serve {
        /// Address and port to bind the server to
        #[arg(long)]
        addr: Option<String>,

        /// Folder containing one subdirectory per app
        #[arg(long)]
        apps_dir: Option<PathBuf>,

        /// Directory holding the hub's own front-end
        #[arg(long, conflicts_with = "no_frontend")]
        frontend_dir: Option<PathBuf>,

        /// Record store URL
        #[arg(long)]
        database_url: Option<String>,

        /// Do not serve a front-end at `/`
        #[arg(long, default_value_t = false)]
        no_frontend: bool,
    },
    /// Scan the apps folder and print what was found as JSON
    Apps {
        /// Folder containing one subdirectory per app
        #[arg(long)]
        apps_dir: Option<PathBuf>,
    },
}

/// Execute the parsed command.
///
/// # Errors
///
/// Configuration cannot be loaded, the router cannot be built, or the
/// listener cannot be bound.
pub fn run_cli(cli: Cli) -> Result<()> {
    let mut config = HubConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve {
            addr,
            apps_dir,
            frontend_dir,
            database_url,
            no_frontend,
        } => {
            if let Some(addr) = addr {
                config.addr = addr;
            }
            if let Some(dir) = apps_dir {
                config.apps_dir = dir;
            }
            if let Some(dir) = frontend_dir {
                config.frontend_dir = Some(dir);
            }
            if no_frontend {
                config.frontend_dir = None;
            }
            if let Some(url) = database_url {
                config.database_url = Some(url);
            }
            serve(&config)
        }
        Commands::Apps { apps_dir } => {
            let root = apps_dir.unwrap_or(config.apps_dir);
            let apps = scan_apps(&root)
                .with_context(|| format!("Failed to scan {}", root.display()))?;
            println!("{}", serde_json::to_string_pretty(&apps)?);
            Ok(())
        }
    }
}

/// Assemble the service for `config`: scan the apps folder, open the record
/// store and install the middleware chain.
///
/// A store that cannot be opened is logged and the hub runs without one.
///
/// # Errors
///
/// The route table fails to compile.
pub fn build_service(config: &HubConfig) -> Result<AppService> {
    let registry = Arc::new(AppRegistry::new(config.apps_dir.clone()));
    registry.scan();
    info!(
        root = %registry.root().display(),
        apps = registry.snapshot().len(),
        "Apps discovered"
    );

    let store: Option<Arc<dyn RecordStore>> = match config.database_url.as_deref() {
        Some(url) => match open_store(url) {
            Ok(store) => {
                info!(backend = store.backend_name(), "Record store ready");
                Some(store)
            }
            Err(err) => {
                warn!(error = %err, "Record store unavailable, continuing without persistence");
                None
            }
        },
        None => {
            info!("No DATABASE_URL configured, running without persistence");
            None
        }
    };

    let frontend = match &config.frontend_dir {
        Some(dir) if dir.is_dir() => Some(StaticFiles::new(dir.clone())),
        Some(dir) => {
            warn!(dir = %dir.display(), "Front-end directory missing, not serving /");
            None
        }
        None => None,
    };

    let router = Router::hub().context("Failed to compile route table")?;
    Ok(AppService::new(AppState::new(registry, store, frontend), router)
        .with_middleware(Arc::new(TracingMiddleware))
        .with_middleware(Arc::new(CorsMiddleware::for_origin(&config.cors_origin))))
}

fn serve(config: &HubConfig) -> Result<()> {
    may::config().set_stack_size(config.stack_size);
    let service = build_service(config)?;
    let handle = HttpServer(service)
        .start(config.addr.as_str())
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    handle
        .wait_ready()
        .context("Server did not start accepting connections")?;
    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown requested");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle.join().map_err(|_| anyhow::anyhow!("Server coroutine panicked"))
}
