//! GECToR Server
//!
//! Loads the GECToR model named by the params file once, then serves
//! corrections over HTTP.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tracing::{info, warn};

use gector_server::{create_router, shutdown_signal, AppState, Cli, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.debug);

    info!("Starting GECToR server");

    // Load configuration
    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Params file: {}", config.params_path.display());

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::load(config).await?.with_metrics(metrics_handle);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        let signal = shutdown_signal().await;
        warn!(%signal, "Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("gector=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gector=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder and describe the service metrics
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "gector_requests_total",
        "Total number of /gector requests by envelope status"
    );
    metrics::describe_counter!(
        "gector_corrections_total",
        "Total number of sentence updates applied"
    );
    metrics::describe_histogram!(
        "gector_request_latency_us",
        metrics::Unit::Microseconds,
        "End-to-end /gector latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
