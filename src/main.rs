use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jira_bridge::config::{AppConfig, Environment};
use jira_bridge::AppState;

#[derive(Parser)]
#[command(name = "jira-bridge")]
#[command(about = "Jira Cloud proxy for assistant clients")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
    host: String,

    #[arg(long, help = "Environment preset: development, staging or production (overrides APP_ENV)")]
    env: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JIRA_URL, JIRA_TOKEN, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jira_bridge=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(env) = &cli.env {
        std::env::set_var("APP_ENV", env);
    }
    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.api.port = port;
    }
    if config.environment == Environment::Production && !config.oauth.is_enabled() {
        tracing::warn!("OAuth is not configured; only static Jira credentials will be used");
    }
    if config.jira.static_target().is_none() && !config.oauth.is_enabled() {
        tracing::warn!("neither JIRA_URL/JIRA_EMAIL/JIRA_TOKEN nor OAuth is configured; Jira routes will answer 401");
    }

    tracing::info!("Starting jira-bridge in {:?} mode", config.environment);

    let bind_addr = format!("{}:{}", cli.host, config.api.port);
    let state = AppState::new(config).context("failed to build HTTP client")?;
    state.spawn_purge_task(Duration::from_secs(300));

    let app = jira_bridge::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("jira-bridge listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
