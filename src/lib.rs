//! dynamo-kv - a Dynamo-style replicated key-value store.
//!
//! Every replica keeps a multi-version store keyed by string. Writes are
//! stamped with vector clocks, replicated to a write quorum, read back from
//! a read quorum, and converged by full-store gossip. Concurrent versions
//! are never silently dropped; a read returns all of them.
//!
//! The wire types and the clock/reconcile algebra live in `dynamo-proto`.

pub mod cluster;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod network;
pub mod node;
pub mod telemetry;

pub use cluster::{Cluster, ClusterHandle};
pub use config::Config;
pub use error::{NodeError, NodeResult, TransportError};
pub use network::{DynamoClient, Gateway, LocalTransport, PeerTransport, TcpTransport};
pub use node::{PutReceipt, Quorum, ReplicaNode};
