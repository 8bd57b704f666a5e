//! cqa-ai - Code quality assessment service
//!
//! Accepts zip archives of student projects, runs each eligible source file
//! through a rate-limited reasoning provider and stores validated
//! assessments with per-project and per-user analytics.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cqa_ai::services::{ChatCompletionsProvider, ProjectRunner};
use cqa_ai::AppState;
use cqa_common::config::{
    load_toml_config, resolve_config_path, resolve_root_folder, write_toml_config, RootFolder,
    TomlConfig,
};

/// Command-line arguments for cqa-ai
#[derive(Parser, Debug)]
#[command(name = "cqa-ai")]
#[command(about = "Code quality assessment service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder holding the database and extracted projects
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CQA_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load config")?,
        None => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cqa_ai={0},cqa_common={0},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cqa-ai (Code Quality Assessment)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) if !path.exists() => match write_toml_config(&config, path) {
            Ok(()) => info!("Wrote default config to {}", path.display()),
            Err(e) => warn!("Could not write default config to {}: {}", path.display(), e),
        },
        Some(path) => info!("Config: {}", path.display()),
        None => warn!("No config directory available, using built-in defaults"),
    }

    // Root folder: CLI → env → TOML → OS default
    let root = RootFolder::new(resolve_root_folder(args.root_folder.as_deref(), &config));
    root.ensure_directories()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", root.path().display());

    let db_path = root.database_path();
    let db = cqa_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database: {}", db_path.display());

    let api_key = cqa_ai::config::resolve_provider_api_key(&db, &config).await?;
    let provider = ChatCompletionsProvider::new(
        &config.provider.base_url,
        api_key,
        std::time::Duration::from_secs(config.provider.request_timeout_secs),
    )
    .context("Failed to build provider client")?;
    info!(
        base_url = %config.provider.base_url,
        preferred_model = %config.provider.preferred_model,
        fallback_model = %config.provider.fallback_model,
        "Reasoning provider configured"
    );

    let runner = ProjectRunner::from_config(db.clone(), &config, root.projects_dir(), Arc::new(provider));
    let recovered = runner
        .recover_interrupted_batches()
        .await
        .context("Failed to recover interrupted batches")?;
    if !recovered.is_empty() {
        warn!("{} interrupted batch(es) marked FAILED", recovered.len());
    }
    let app = cqa_ai::build_router(AppState::new(db, runner));

    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
