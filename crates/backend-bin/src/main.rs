// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the CareLink authentication service.
use std::io::BufRead;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use carelink_backend_lib::{
    auth::password::{hash_password_secure, validate_password_strength},
    config::{LogFormat, Settings},
    router, AppState,
};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "carelink-auth", version, about = "Dual-role authentication and session service")]
struct Cli {
    /// Config file (TOML or JSON). Defaults to config.toml then config.json.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Read a password from stdin and print its scrypt hash for the user store
    HashPassword,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    match settings.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(settings).await?);
    info!(backend = %state.backend, reason = %state.backend_reason, "credential backend ready");

    let app = router::create_router(state);
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn hash_password(settings: &Settings) -> anyhow::Result<()> {
    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    let mut password = password.trim_end_matches(['\r', '\n']).to_string();
    if !validate_password_strength(&password, &settings.password_requirements) {
        anyhow::bail!("password does not meet the configured requirements");
    }
    let hash = hash_password_secure(&mut password, settings.password_hash_log_n)?;
    println!("{hash}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            init_tracing(&settings);
            serve(settings).await
        },
        Command::HashPassword => hash_password(&settings),
    }
}
