//! Prometheus metrics collection for the replica node.
//!
//! - `dynamo_requests_total{method,outcome}` - RPCs served, by result
//! - `dynamo_request_duration_seconds{method}` - RPC latency histogram
//! - `dynamo_peer_failures_total{method,error}` - peer calls that did not contribute
//! - `dynamo_gossip_versions_accepted_total` - versions learned through gossip
//!
//! Recording is a no-op until [`init`] has run.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// RPCs served by method and outcome.
pub static REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

/// RPC latency by method.
pub static REQUEST_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Peer calls that failed, timed out, or were refused during fan-out.
pub static PEER_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Versions accepted from gossip pushes.
pub static GOSSIP_ACCEPTED: OnceLock<IntCounter> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if let Err(e) = r.register(Box::new(m.clone())) {
                    tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                }
                let _ = $metric.set(m);
            }
        };
    }

    register!(REQUESTS, IntCounterVec::new(Opts::new("dynamo_requests_total", "RPCs served by method and outcome"), &["method", "outcome"]));
    register!(REQUEST_LATENCY, HistogramVec::new(
        HistogramOpts::new("dynamo_request_duration_seconds", "RPC latency by method")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method"]));
    register!(PEER_FAILURES, IntCounterVec::new(Opts::new("dynamo_peer_failures_total", "Peer calls that did not contribute"), &["method", "error"]));
    register!(GOSSIP_ACCEPTED, IntCounter::new("dynamo_gossip_versions_accepted_total", "Versions accepted through gossip"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record an RPC outcome.
#[inline]
pub fn record_request(method: &str, outcome: &str) {
    if let Some(c) = REQUESTS.get() {
        c.with_label_values(&[method, outcome]).inc();
    }
}

/// Record RPC latency.
#[inline]
pub fn record_latency(method: &str, duration_secs: f64) {
    if let Some(h) = REQUEST_LATENCY.get() {
        h.with_label_values(&[method]).observe(duration_secs);
    }
}

/// Record a peer call that did not contribute to a fan-out.
#[inline]
pub fn record_peer_failure(method: &str, error: &str) {
    if let Some(c) = PEER_FAILURES.get() {
        c.with_label_values(&[method, error]).inc();
    }
}

#[inline]
pub fn record_gossip_accepted(versions: usize) {
    if let Some(c) = GOSSIP_ACCEPTED.get() {
        c.inc_by(versions as u64);
    }
}
