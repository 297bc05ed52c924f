//! Courier
//!
//! Command-line entry point:
//! - Serve the dispatcher over HTTP
//! - Invoke the dispatcher once with a serverless event envelope
//! - Generate a default config file
//!
//! # Configuration
//!
//! `--config <path>` or the default locations (see `courier config`).
//! Environment variables override file settings:
//! - `COURIER_HOST`, `COURIER_PORT`
//! - `COURIER_LOG_LEVEL`, `COURIER_LOG_FORMAT`
//! - `RUST_LOG`: Full tracing filter (takes precedence over the log level)

use clap::{Parser, Subcommand};
use courier::api::{serve, AppState};
use courier::config::{generate_default_config, Config, ConfigError, LoggingConfig};
use courier::dispatch::{Event, InvocationContext};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "courier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Registry-backed messaging event dispatcher")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the bind port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Dispatch a single event envelope and print the response envelope
    Invoke {
        /// Path to the event JSON (default: stdin)
        path: Option<PathBuf>,
        /// Request id to use as the connection id
        #[arg(long)]
        request_id: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    match command {
        Commands::Config { output } => write_default_config(output)?,
        Commands::Serve { host, port } => {
            let mut config = load_config(cli.config.as_deref())?;
            init_tracing(&config.logging);

            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!("Starting Courier v{}", env!("CARGO_PKG_VERSION"));

            let state = AppState::from_config(&config);
            serve(state, &config.server).await?;

            tracing::info!("Courier stopped");
        }
        Commands::Invoke { path, request_id } => {
            let config = load_config(cli.config.as_deref())?;
            init_tracing(&config.logging);

            let raw = match path {
                Some(path) => std::fs::read_to_string(&path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let event: Event = serde_json::from_str(&raw)?;
            let ctx = match request_id {
                Some(id) => InvocationContext::new(id),
                None => InvocationContext::for_event(&event),
            };

            let state = AppState::from_config(&config);
            let response = state.dispatcher.handle(&event, &ctx).await;

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_with_env(path),
        None => Ok(Config::load_default()),
    }
}

fn write_default_config(output: Option<PathBuf>) -> std::io::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }

    Ok(())
}

/// Initialize tracing from the logging config
///
/// Logs go to stderr so `invoke` output stays machine-readable.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("courier={},tower_http=debug", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
