//! Telemetry utilities for RPC timing and request correlation.

use std::time::Instant;

/// Guard for timing an RPC and recording its latency.
///
/// Records latency when dropped.
pub struct OperationTimer {
    method: &'static str,
    start: Instant,
}

impl OperationTimer {
    /// Start timing an RPC.
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            start: Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_latency(self.method, duration);
    }
}

/// Standardized span constructors for replica observability.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Create a span for a replica's lifetime tasks.
    pub fn node(node_id: &str, endpoint: &str) -> Span {
        info_span!("node", node = %node_id, endpoint = %endpoint)
    }

    /// Create a span for one inbound RPC, tagged with a fresh request id.
    pub fn rpc(node_id: &str, method: &str) -> Span {
        let request_id = uuid::Uuid::new_v4();
        info_span!("rpc", node = %node_id, method = %method, request_id = %request_id)
    }

    /// Create a span for a quorum or gossip walk over peers.
    pub fn fanout(node_id: &str, method: &str, key: &str) -> Span {
        debug_span!("fanout", node = %node_id, method = %method, key = %key)
    }
}
