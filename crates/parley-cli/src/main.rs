use clap::{Parser, Subcommand};
use parley_auth::{FileUserStore, TokenService};
use parley_engine::{AgentEngine, HttpEngine, ScriptedEngine};
use parley_gateway::GatewayServer;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley", about = "Parley — chat relay gateway")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "parley.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Deserialize, Default)]
struct ParleyConfig {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    auth: AuthConfig,
    #[serde(default)]
    engine: EngineConfig,
}

#[derive(Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize, Default)]
struct AuthConfig {
    /// HS256 signing secret. Token enforcement on the chat endpoints is
    /// off until one is configured.
    #[serde(default)]
    secret: Option<String>,
    #[serde(default = "default_token_ttl")]
    token_ttl_secs: i64,
}

#[derive(Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EngineConfig {
    /// Deterministic echo engine, for local dev and demos.
    #[default]
    Scripted,
    /// A real agent engine reached over HTTP.
    Http { base_url: String },
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_token_ttl() -> i64 {
    parley_auth::DEFAULT_TTL_SECS
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    // Load config; a missing file means defaults (scripted engine, no auth)
    let config: ParleyConfig = match tokio::fs::read_to_string(&cli.config).await {
        Ok(text) => toml::from_str(&text)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %cli.config.display(), "no config file, using defaults");
            ParleyConfig::default()
        }
        Err(e) => {
            return Err(anyhow::anyhow!(
                "Failed to read config file '{}': {}",
                cli.config.display(),
                e
            ))
        }
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let engine: Arc<dyn AgentEngine> = match config.engine {
                EngineConfig::Scripted => {
                    info!("using scripted engine");
                    Arc::new(ScriptedEngine::new())
                }
                EngineConfig::Http { base_url } => {
                    info!(%base_url, "using HTTP engine");
                    Arc::new(HttpEngine::new(base_url))
                }
            };

            let users = Arc::new(FileUserStore::new(config.data_dir.join("users")).await?);

            let app = match config.auth.secret {
                Some(secret) => {
                    info!("bearer token auth enabled");
                    let tokens = Arc::new(TokenService::with_ttl(
                        secret.as_bytes(),
                        config.auth.token_ttl_secs,
                    ));
                    GatewayServer::build_with_auth(engine, users, tokens, true)
                }
                None => {
                    info!("no auth secret configured, chat endpoints are open");
                    GatewayServer::build(engine, users)
                }
            };

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Parley gateway listening on {}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
