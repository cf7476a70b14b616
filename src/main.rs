//! Proxy event adapter server.
//!
//! Serves a built-in echo handler that answers every request with the proxy
//! event it received, as JSON. Useful for checking how requests translate.
//!
//! ```text
//! proxy-event-adapter --config adapter.toml
//! proxy-event-adapter --resource '/users/{userId}' --bind 127.0.0.1:8080
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use proxy_event_adapter::config::{load_config, validation::validate_config, AdapterConfig, ConfigError};
use proxy_event_adapter::observability::{logging, metrics};
use proxy_event_adapter::{handler_fn, BoxError, HttpServer, ProxyAdapter, ProxyRequest, ProxyResponse, Shutdown};

#[derive(Parser)]
#[command(name = "proxy-event-adapter")]
#[command(about = "Serve a proxy event handler over HTTP", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override route.resource.
    #[arg(short, long)]
    resource: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AdapterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(resource) = cli.resource {
        config.route.resource = resource;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability.log_level)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        resource = %config.route.resource,
        stage = %config.route.stage,
        stage_variables = config.stage_variables.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let adapter = ProxyAdapter::from_config(handler_fn(echo), &config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    HttpServer::new(config, adapter)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn echo(request: ProxyRequest) -> Result<ProxyResponse, BoxError> {
    let body = serde_json::to_string_pretty(&request)?;
    Ok(ProxyResponse::new(200)
        .with_header("Content-Type", "application/json")
        .with_body(body))
}
