//! Cluster launcher.
//!
//! Builds one [`ReplicaNode`] per configured node (or just the one selected
//! on the command line), binds its RPC listener, installs its preference
//! list and starts the background tasks that keep it serving.

use crate::config::Config;
use crate::network::{Gateway, TcpTransport};
use crate::node::{Quorum, ReplicaNode};
use crate::telemetry::spans;
use anyhow::Context as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

/// Running replicas and the tasks serving them.
pub struct ClusterHandle {
    nodes: Vec<Arc<ReplicaNode>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ClusterHandle {
    pub fn nodes(&self) -> &[Arc<ReplicaNode>] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Arc<ReplicaNode>> {
        self.nodes.iter().find(|n| n.node_id() == id)
    }

    /// Stop accepting connections and cancel periodic gossip.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!(nodes = self.nodes.len(), "Cluster stopped");
    }

    /// Wait until every serving task exits.
    pub async fn wait(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

pub struct Cluster;

impl Cluster {
    /// Start the configured replicas.
    ///
    /// With `only = Some(id)` just that node runs in this process; its peers
    /// are expected to be running elsewhere. The node at ring position `i`
    /// gets the ring rotated `i` times as its preference list.
    pub async fn launch(config: &Config, only: Option<&str>) -> anyhow::Result<ClusterHandle> {
        let selected: Vec<usize> = match only {
            Some(id) => {
                let (index, _) = config
                    .node(id)
                    .with_context(|| format!("node '{id}' is not configured"))?;
                vec![index]
            }
            None => (0..config.nodes.len()).collect(),
        };

        let quorum = Quorum::new(config.cluster.write_quorum, config.cluster.read_quorum);
        let rpc_timeout = config.cluster.rpc_timeout();
        let transport = Arc::new(TcpTransport::new(rpc_timeout));

        let mut nodes = Vec::with_capacity(selected.len());
        let mut tasks = Vec::new();

        for index in selected {
            let node_config = &config.nodes[index];
            let node = Arc::new(
                ReplicaNode::new(
                    node_config.identity(),
                    node_config.id.clone(),
                    quorum,
                    transport.clone(),
                )
                .with_rpc_timeout(rpc_timeout),
            );
            node.send_preference_list(config.preference_list(index));

            let gateway = Gateway::bind(Arc::clone(&node))
                .await
                .with_context(|| format!("failed to bind {}", node_config.identity()))?;
            let span = spans::node(node.node_id(), &node.identity().endpoint());
            tasks.push(tokio::spawn(gateway.run().instrument(span)));

            if let Some(interval) = config.cluster.gossip_interval() {
                tasks.push(spawn_gossip_task(Arc::clone(&node), interval));
            }

            info!(
                node = %node.node_id(),
                endpoint = %node.identity(),
                write_quorum = quorum.write,
                read_quorum = quorum.read,
                "Replica started"
            );
            nodes.push(node);
        }

        Ok(ClusterHandle { nodes, tasks })
    }
}

/// Push the node's store to its peers every `interval`. Rounds are skipped
/// while the node is crashed.
pub fn spawn_gossip_task(node: Arc<ReplicaNode>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if node.is_crashed() {
                debug!(node = %node.node_id(), "Skipping gossip round while crashed");
                continue;
            }
            if let Err(e) = node.gossip().await {
                warn!(node = %node.node_id(), error = %e, "Gossip round failed");
            }
        }
    })
}
