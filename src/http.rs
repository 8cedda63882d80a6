//! Operator HTTP endpoint.
//!
//! Serves `/metrics` for Prometheus scraping and `/status`, a JSON view of
//! each local replica's availability and preference list.

use crate::node::ReplicaNode;
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ReplicaStatus {
    id: String,
    endpoint: String,
    crashed: bool,
    crashed_until: Option<String>,
    keys: usize,
    preference_list: Vec<String>,
}

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn status_handler(
    State(nodes): State<Arc<Vec<Arc<ReplicaNode>>>>,
) -> Json<Vec<ReplicaStatus>> {
    let mut statuses = Vec::with_capacity(nodes.len());
    for node in nodes.iter() {
        statuses.push(ReplicaStatus {
            id: node.node_id().to_string(),
            endpoint: node.identity().endpoint(),
            crashed: node.is_crashed(),
            crashed_until: node.crashed_until().map(|t| t.to_rfc3339()),
            keys: node.key_count().await,
            preference_list: node
                .preference_list()
                .iter()
                .map(|peer| peer.endpoint())
                .collect(),
        });
    }
    Json(statuses)
}

/// Build the router for the given local replicas.
pub fn router(nodes: Vec<Arc<ReplicaNode>>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .with_state(Arc::new(nodes))
}

/// Serve the operator endpoint on `0.0.0.0:port` until the task is aborted.
pub async fn run_http_server(port: u16, nodes: Vec<Arc<ReplicaNode>>) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind HTTP endpoint");
            return;
        }
    };
    tracing::info!(%addr, "HTTP endpoint listening (/metrics, /status)");

    if let Err(e) = axum::serve(listener, router(nodes)).await {
        tracing::error!(error = %e, "HTTP endpoint error");
    }
}
