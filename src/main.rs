//! dynamod - replica daemon.
//!
//! Usage: `dynamod [config.toml] [node-id]`. Without a node id every
//! configured replica runs in this process.

use dynamo_kv::cluster::Cluster;
use dynamo_kv::config::{self, Config};
use dynamo_kv::{http, metrics};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("DYNAMO_LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    // Load configuration
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "dynamo.toml".to_string());
    let only = args.next();

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        nodes = config.nodes.len(),
        write_quorum = config.cluster.write_quorum,
        read_quorum = config.cluster.read_quorum,
        only = ?only,
        "Starting dynamod"
    );

    let cluster = Cluster::launch(&config, only.as_deref()).await?;

    // Convention: metrics port 0 (or no [metrics] table) disables the HTTP endpoint.
    let metrics_port = config.metrics.as_ref().map_or(0, |m| m.port);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        let nodes = cluster.nodes().to_vec();
        tokio::spawn(async move {
            http::run_http_server(metrics_port, nodes).await;
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    cluster.shutdown();

    Ok(())
}
