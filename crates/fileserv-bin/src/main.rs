use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fileserv_core::config::ServerConfig;
use fileserv_core::routes;

#[derive(Parser, Debug)]
#[command(name = "fileserv")]
#[command(about = "Browser-based file manager for a shared directory")]
#[command(version)]
struct Cli {
    /// Directory to share (created if missing)
    #[arg(long, env = "FILESERV_ROOT")]
    root: Option<PathBuf>,

    /// Address to listen on (e.g. 127.0.0.1:8000)
    #[arg(long, env = "FILESERV_LISTEN")]
    listen: Option<String>,

    /// Directory holding the static browser UI
    #[arg(long, env = "FILESERV_WEBUI")]
    webui: Option<PathBuf>,

    /// Path to config file
    #[arg(long, env = "FILESERV_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FILESERV_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!("fileserv v{} starting", env!("CARGO_PKG_VERSION"));

    // Load config, then let CLI args override file values
    let config_path = cli.config_path.unwrap_or_else(ServerConfig::default_path);
    let mut config = if config_path.exists() {
        info!("loading config from {}", config_path.display());
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::default()
    };

    if let Some(root) = cli.root {
        config.root_dir = root;
    }
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(webui) = cli.webui {
        config.webui_dir = webui;
    }

    std::fs::create_dir_all(&config.root_dir).with_context(|| {
        format!(
            "failed to create root directory {}",
            config.root_dir.display()
        )
    })?;
    // Pin the root to an absolute path before any client path joins it.
    config.root_dir = config
        .root_dir
        .canonicalize()
        .with_context(|| format!("failed to resolve root {}", config.root_dir.display()))?;

    let app = routes::router(&config);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    info!(
        "sharing {} on http://{}",
        config.root_dir.display(),
        config.listen_addr
    );
    info!("browser UI at http://{}/ui/", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, shutting down");
}
