//! Backend aggregator entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use backend_aggregator::api::{create_router, AppState};
use backend_aggregator::client::HttpTransport;
use backend_aggregator::config::Config;
use backend_aggregator::endpoint::Backend;
use backend_aggregator::fetcher::fetch_greeting;
use backend_aggregator::metrics;
use backend_aggregator::store::AggregateStore;
use backend_aggregator::utils::shutdown_signal;

/// Merges health and listings from the Node and Go backends.
#[derive(Parser, Debug)]
#[command(name = "backend-aggregator")]
#[command(about = "Unified view over two independently deployed backends")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port for the state API.
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the aggregate state over HTTP (default).
    Serve {
        /// HTTP server port for the state API.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Probe both backends' health once.
    Health,

    /// Fetch listings once and print the merged view.
    Items {
        /// Only fetch this backend.
        #[arg(long)]
        backend: Option<Backend>,
    },

    /// Fetch each backend's greeting.
    Hello,

    /// Show the resolved configuration.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging. Loading first picks up RUST_LOG from .env too.
    let log_level = Config::load()
        .map(|config| config.rust_log)
        .unwrap_or_else(|_| Config::default().rust_log);
    let filter = if args.verbose {
        EnvFilter::new("backend_aggregator=debug,info")
    } else {
        EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Health) => cmd_health().await,
        Some(Command::Items { backend }) => cmd_items(backend).await,
        Some(Command::Hello) => cmd_hello().await,
        Some(Command::Serve { port }) => cmd_serve(port).await,
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Build the store over the HTTP transport.
fn build_store(config: &Config) -> anyhow::Result<Arc<AggregateStore<HttpTransport>>> {
    Ok(Arc::new(AggregateStore::from_config(config)?))
}

/// Show the resolved configuration.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("BACKEND AGGREGATOR - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Endpoints:");
    for (backend, endpoint) in config.endpoints().iter() {
        println!("  {:<5} {}", backend, endpoint.base_url());
    }
    match config.request_timeout() {
        Some(timeout) => println!("  Request timeout: {:?}", timeout),
        None => println!("  Request timeout: none"),
    }
    println!("  Port: {}", config.port);
    println!(
        "  Metrics: {}",
        if config.metrics_enabled { "Enabled" } else { "Disabled" }
    );
    println!("======================================================================");

    Ok(())
}

/// Probe both backends once.
async fn cmd_health() -> anyhow::Result<()> {
    let config = load_config()?;
    let store = build_store(&config)?;

    store.load_health().await;
    let state = store.snapshot();

    println!("======================================================================");
    println!("BACKEND HEALTH");
    println!("======================================================================");
    for backend in Backend::iter() {
        match state.health_of(backend) {
            Some(health) if health.is_healthy() => println!(
                "  {:<5} {} ({})",
                backend,
                health.status.as_deref().unwrap_or_default(),
                health.timestamp.as_deref().unwrap_or("-"),
            ),
            Some(health) => println!(
                "  {:<5} unavailable: {}",
                backend,
                health.error.as_deref().unwrap_or("unknown error"),
            ),
            None => println!("  {:<5} not probed", backend),
        }
    }
    println!("======================================================================");

    Ok(())
}

/// Fetch listings once and print the merged view.
async fn cmd_items(backend: Option<Backend>) -> anyhow::Result<()> {
    let config = load_config()?;
    let store = build_store(&config)?;

    match backend {
        Some(backend) => store.load_backend_items(backend).await,
        None => store.load_all_items().await,
    }
    let state = store.snapshot();

    println!("======================================================================");
    println!("MERGED ITEMS ({})", state.merged.len());
    println!("======================================================================");
    for item in &state.merged {
        println!(
            "  {:>4}  {:<24} {}",
            item.id().map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
            item.name().unwrap_or("-"),
            item.kind().unwrap_or("-"),
        );
    }
    println!("----------------------------------------------------------------------");
    for count in state.type_counts() {
        println!("  {}: {}", count.kind, count.count);
    }
    println!("======================================================================");

    Ok(())
}

/// Fetch each backend's greeting.
async fn cmd_hello() -> anyhow::Result<()> {
    let config = load_config()?;
    let transport = HttpTransport::new(config.request_timeout())?;
    let endpoints = config.endpoints();

    for (backend, endpoint) in endpoints.iter() {
        match fetch_greeting(&transport, endpoint, backend.greeting_path()).await {
            Ok(greeting) => println!(
                "  {:<5} {} (v{})",
                backend,
                greeting.message,
                greeting.version.as_deref().unwrap_or("?"),
            ),
            Err(e) => println!("  {:<5} FAILED: {}", backend, e),
        }
    }

    Ok(())
}

/// Serve the aggregate state over HTTP.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.port = port;
    }

    let store = build_store(&config)?;
    for (backend, endpoint) in store.endpoints().iter() {
        info!(backend = %backend, base_url = %endpoint.base_url(), "Resolved endpoint");
    }

    let mut app_state = AppState::new(Arc::clone(&store));
    if config.metrics_enabled {
        let handle = metrics::install_prometheus()?;
        app_state = app_state.with_metrics(handle);
    }

    // Initial load, like a first page view.
    let initial = Arc::clone(&store);
    tokio::spawn(async move {
        initial.refresh().await;
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
