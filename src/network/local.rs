//! In-process transport: nodes in one process call each other directly.
//!
//! Used to simulate a cluster without sockets. A node that was never
//! registered, was unregistered, or has been dropped is unreachable, which
//! is how tests model a partition.

use crate::error::TransportError;
use crate::network::PeerTransport;
use crate::node::ReplicaNode;
use async_trait::async_trait;
use dashmap::DashMap;
use dynamo_proto::{ObjectEntry, ReplicaIdentity, StoreSnapshot, VersionSet};
use std::io;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Default)]
pub struct LocalTransport {
    nodes: Arc<DashMap<ReplicaIdentity, Weak<ReplicaNode>>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `node` reachable at its identity.
    pub fn register(&self, node: &Arc<ReplicaNode>) {
        self.nodes
            .insert(node.identity().clone(), Arc::downgrade(node));
    }

    /// Cut `identity` off from every node sharing this transport.
    pub fn unregister(&self, identity: &ReplicaIdentity) {
        self.nodes.remove(identity);
    }

    fn lookup(&self, peer: &ReplicaIdentity) -> Result<Arc<ReplicaNode>, TransportError> {
        self.nodes
            .get(peer)
            .and_then(|node| node.upgrade())
            .ok_or_else(|| TransportError::Unreachable {
                peer: peer.to_string(),
                source: io::Error::new(io::ErrorKind::NotConnected, "no such node"),
            })
    }
}

#[async_trait]
impl PeerTransport for LocalTransport {
    async fn s_put(
        &self,
        peer: &ReplicaIdentity,
        key: &str,
        entries: &[ObjectEntry],
    ) -> Result<bool, TransportError> {
        let node = self.lookup(peer)?;
        Ok(node.s_put(key, entries).await.map_err(dynamo_proto::RpcError::from)?)
    }

    async fn s_get(&self, peer: &ReplicaIdentity, key: &str) -> Result<VersionSet, TransportError> {
        let node = self.lookup(peer)?;
        Ok(node.s_get(key).await.map_err(dynamo_proto::RpcError::from)?)
    }

    async fn s_gossip(
        &self,
        peer: &ReplicaIdentity,
        store: &StoreSnapshot,
    ) -> Result<(), TransportError> {
        let node = self.lookup(peer)?;
        Ok(node.s_gossip(store).await.map_err(dynamo_proto::RpcError::from)?)
    }
}
