//! Velarium server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   velarium serve                                      velarium migrate
//!        │                                                    │
//!        ▼                                                    ▼
//!   ┌─────────────────────── StartupSequencer ──────┐   provision session
//!   │ 1. AgentFactory::create        (fatal)        │   storage and exit
//!   │ 2. SessionStoreFactory::open   (degrades)     │
//!   │ 3. RouteConfigurator + FilterChain            │
//!   │ 4. ServerRunner (TCP │ TLS │ Unix socket)     │
//!   └───────────────────────────────────────────────┘
//!        │
//!   request → SchemeNormalizer → ForwardedClient → RequestMetrics → handler
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use velarium::config::{self, validation::validate_config, ConfigError, VelariumConfig};
use velarium::lifecycle::{signals, Shutdown, StartupSequencer};
use velarium::observability::{logging, metrics};
use velarium::sessions::{self, MigrationOutcome};

#[derive(Parser)]
#[command(name = "velarium")]
#[command(about = "Conversational agent server", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "VELARIUM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve(ServeArgs),
    /// Provision session storage
    Migrate,
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Host to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Unix socket path; takes precedence over host and port
    #[arg(long)]
    socket: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => VelariumConfig::default(),
    };
    config::apply_env(&mut config);

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "velarium starting");

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Migrate => migrate(&config).await,
        Command::Serve(args) => serve(config, args).await,
    }
}

async fn migrate(config: &VelariumConfig) -> Result<(), Box<dyn std::error::Error>> {
    match sessions::migrate(&config.sessions.path).await? {
        MigrationOutcome::Applied => println!("Migrated session store at {}", config.sessions.path.display()),
        MigrationOutcome::AlreadyCurrent => println!("Session store at {} is up to date", config.sessions.path.display()),
    }
    Ok(())
}

async fn serve(mut config: VelariumConfig, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.socket.is_some() {
        config.server.socket = args.socket;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        bind = %config.server.bind_target(),
        tls = config.server.tls.is_some(),
        debug = config.server.debug,
        sessions = %config.sessions.path.display(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let shutdown = Shutdown::new();
    signals::forward_signals(shutdown.clone());

    StartupSequencer::from_config(&config)
        .run(shutdown.signalled())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Fatal startup error");
            e
        })?;

    tracing::info!("Shutdown complete");
    Ok(())
}
