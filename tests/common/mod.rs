//! Integration test common infrastructure.
//!
//! Provides an in-process cluster wired through [`LocalTransport`], with
//! helpers for partitioning and healing individual replicas.

use dynamo_kv::network::LocalTransport;
use dynamo_kv::node::{Quorum, ReplicaNode};
use dynamo_proto::{ReplicaIdentity, preference_list_for};
use std::sync::Arc;
use std::time::Duration;

/// Replicas sharing one in-process transport.
pub struct TestCluster {
    pub net: LocalTransport,
    pub nodes: Vec<Arc<ReplicaNode>>,
}

#[allow(dead_code)]
impl TestCluster {
    /// `size` replicas named `n1..`, at `localhost:8000..`, each with the
    /// ring rotated to start at itself.
    pub fn new(size: usize, write: usize, read: usize) -> Self {
        let net = LocalTransport::new();
        let ring: Vec<ReplicaIdentity> = (0..size)
            .map(|i| ReplicaIdentity::new("localhost", 8000 + i as u16))
            .collect();

        let nodes: Vec<Arc<ReplicaNode>> = ring
            .iter()
            .enumerate()
            .map(|(i, identity)| {
                let node = Arc::new(
                    ReplicaNode::new(
                        identity.clone(),
                        format!("n{}", i + 1),
                        Quorum::new(write, read),
                        Arc::new(net.clone()),
                    )
                    .with_rpc_timeout(Duration::from_millis(200)),
                );
                node.send_preference_list(preference_list_for(&ring, i));
                net.register(&node);
                node
            })
            .collect();

        Self { net, nodes }
    }

    pub fn node(&self, index: usize) -> &Arc<ReplicaNode> {
        &self.nodes[index]
    }

    /// Make replica `index` unreachable from every other replica.
    pub fn partition(&self, index: usize) {
        self.net.unregister(self.nodes[index].identity());
    }

    pub fn heal(&self, index: usize) {
        self.net.register(&self.nodes[index]);
    }

    /// One gossip round from every available replica.
    pub async fn gossip_all(&self) {
        for node in &self.nodes {
            let _ = node.gossip().await;
        }
    }
}
