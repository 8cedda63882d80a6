//! How a node reaches its peers.
//!
//! [`PeerTransport`] is the typed contract for the three peer-only calls a
//! node makes during fan-out. [`TcpTransport`] speaks the RPC protocol over
//! the network; [`super::LocalTransport`] calls nodes in the same process.

use crate::error::TransportError;
use crate::network::DynamoClient;
use async_trait::async_trait;
use dynamo_proto::{ObjectEntry, ReplicaIdentity, StoreSnapshot, VersionSet};
use std::time::Duration;

#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Replicate `entries` for `key` onto `peer`.
    async fn s_put(
        &self,
        peer: &ReplicaIdentity,
        key: &str,
        entries: &[ObjectEntry],
    ) -> Result<bool, TransportError>;

    /// Fetch `peer`'s version set for `key`.
    async fn s_get(&self, peer: &ReplicaIdentity, key: &str) -> Result<VersionSet, TransportError>;

    /// Push a full store snapshot to `peer`.
    async fn s_gossip(
        &self,
        peer: &ReplicaIdentity,
        store: &StoreSnapshot,
    ) -> Result<(), TransportError>;
}

/// Peer calls over TCP, one connection per call.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self, peer: &ReplicaIdentity) -> DynamoClient {
        DynamoClient::for_replica(peer).with_timeout(self.timeout)
    }
}

#[async_trait]
impl PeerTransport for TcpTransport {
    async fn s_put(
        &self,
        peer: &ReplicaIdentity,
        key: &str,
        entries: &[ObjectEntry],
    ) -> Result<bool, TransportError> {
        self.client(peer).s_put(key, entries).await
    }

    async fn s_get(&self, peer: &ReplicaIdentity, key: &str) -> Result<VersionSet, TransportError> {
        self.client(peer).s_get(key).await
    }

    async fn s_gossip(
        &self,
        peer: &ReplicaIdentity,
        store: &StoreSnapshot,
    ) -> Result<(), TransportError> {
        self.client(peer).s_gossip(store).await
    }
}
