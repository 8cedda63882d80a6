//! # dynamo-proto
//!
//! Causality primitives and wire protocol for a Dynamo-style replicated
//! key-value store.
//!
//! - [`VectorClock`]: per-replica counters giving a partial causal order
//! - [`ObjectEntry`]: a value tagged with the [`Context`] it was written in
//! - [`reconcile`]: collapse two version sets into one antichain
//! - [`Request`] / [`Reply`]: the typed RPC surface of a replica
//! - [`JsonLinesCodec`]: newline-delimited JSON framing for `tokio_util`
//!
//! ## Example
//!
//! ```rust
//! use dynamo_proto::{reconcile, Context, ObjectEntry, VectorClock};
//!
//! let mut clock = VectorClock::new();
//! clock.increment("n1");
//! let first = ObjectEntry::new(Context::new(clock.clone()), "v1");
//!
//! clock.increment("n1");
//! let second = ObjectEntry::new(Context::new(clock), "v2");
//!
//! let merged = reconcile(&[first], &[second.clone()]);
//! assert_eq!(merged.versions, vec![second]);
//! assert_eq!(merged.new_count, 1);
//! ```

#![deny(clippy::all)]

pub mod clock;
pub mod codec;
pub mod entry;
pub mod error;
pub mod identity;
pub mod reconcile;
pub mod rpc;

pub use clock::VectorClock;
pub use codec::{JsonLinesCodec, MAX_FRAME_LEN};
pub use entry::{Context, ObjectEntry, StoreSnapshot, VersionSet};
pub use error::ProtocolError;
pub use identity::{ReplicaIdentity, preference_list_for, rotate_preference_list};
pub use reconcile::{Reconciled, reconcile};
pub use rpc::{Reply, Request, Response, RpcError, gossip_batches};
