//! Replica node: quorum reads and writes, peer replication, gossip, and
//! fault injection.
//!
//! Each [`ReplicaNode`] owns its store, its crash state and its preference
//! list. Client operations ([`ReplicaNode::put`], [`ReplicaNode::get`])
//! update the local store and then walk the preference list, calling the
//! peer-only operations on other nodes through a [`PeerTransport`] until the
//! write or read quorum is met. Every peer call is bounded by the node's RPC
//! timeout; a peer that fails or times out is skipped.

pub mod crash;
pub mod store;

use crate::error::{NodeError, NodeResult, TransportError};
use crate::metrics;
use crate::network::PeerTransport;
use crate::telemetry::spans;
use dynamo_proto::{Context, ObjectEntry, ReplicaIdentity, StoreSnapshot, VersionSet, reconcile};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, warn};

pub use crash::CrashState;
pub use store::ReplicatedStore;

/// Default bound on a single peer call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_millis(500);

/// Write (W) and read (R) quorum sizes. Both count the serving node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quorum {
    pub write: usize,
    pub read: usize,
}

impl Quorum {
    pub fn new(write: usize, read: usize) -> Self {
        Self { write, read }
    }
}

/// Outcome of a successful Put.
///
/// A Put succeeds once the local merge is stored, even if fewer than W
/// replicas acknowledged; the shortfall is left to gossip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutReceipt {
    /// Replicas holding the write, including this node.
    pub acks: usize,
    pub write_quorum: usize,
}

impl PutReceipt {
    pub fn quorum_met(&self) -> bool {
        self.acks >= self.write_quorum
    }
}

pub struct ReplicaNode {
    identity: ReplicaIdentity,
    node_id: String,
    quorum: Quorum,
    rpc_timeout: Duration,
    preference_list: RwLock<Vec<ReplicaIdentity>>,
    store: ReplicatedStore,
    crash: CrashState,
    transport: Arc<dyn PeerTransport>,
}

impl ReplicaNode {
    /// Create a node with an empty store and an empty preference list.
    ///
    /// `node_id` is the identifier this node stamps into vector clocks.
    pub fn new(
        identity: ReplicaIdentity,
        node_id: impl Into<String>,
        quorum: Quorum,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        Self {
            identity,
            node_id: node_id.into(),
            quorum,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            preference_list: RwLock::new(Vec::new()),
            store: ReplicatedStore::new(),
            crash: CrashState::new(),
            transport,
        }
    }

    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn identity(&self) -> &ReplicaIdentity {
        &self.identity
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn quorum(&self) -> Quorum {
        self.quorum
    }

    pub fn preference_list(&self) -> Vec<ReplicaIdentity> {
        self.preference_list.read().clone()
    }

    pub fn is_crashed(&self) -> bool {
        self.crash.is_crashed()
    }

    pub fn crashed_until(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.crash.crashed_until()
    }

    /// Copy of the whole local store.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot().await
    }

    /// Number of keys held locally.
    pub async fn key_count(&self) -> usize {
        self.store.read().await.len()
    }

    // ------------------------------------------------------------------
    // Client operations
    // ------------------------------------------------------------------

    /// Write `value` for `key` in causal context `context`.
    ///
    /// The context is stamped with this node's id before merging, so two
    /// writes served here with the same context collide and the second is
    /// rejected as [`NodeError::StaleVersion`]. The store stays exclusively
    /// locked for the whole replication walk.
    pub async fn put(
        &self,
        key: &str,
        mut context: Context,
        value: Vec<u8>,
    ) -> NodeResult<PutReceipt> {
        self.crash.ensure_available()?;

        context.clock.increment(&self.node_id);
        let entry = ObjectEntry::new(context, value);

        let mut store = self.store.write().await;
        let merged = store.merge(key, std::slice::from_ref(&entry));
        if !merged.changed() {
            debug!(
                node = %self.identity,
                key,
                clock = %entry.context.clock,
                "Rejected stale put"
            );
            return Err(NodeError::StaleVersion);
        }
        info!(
            node = %self.identity,
            key,
            versions = merged.versions.len(),
            "PUT"
        );

        let mut acks = 1;
        let fanout = spans::fanout(&self.node_id, "S_Put", key);
        async {
            for peer in self.peers() {
                if acks >= self.quorum.write {
                    break;
                }
                let call = self.transport.s_put(&peer, key, &merged.versions);
                if self.call_peer("S_Put", &peer, call).await.is_ok() {
                    acks += 1;
                }
            }
        }
        .instrument(fanout)
        .await;
        drop(store);

        let receipt = PutReceipt {
            acks,
            write_quorum: self.quorum.write,
        };
        if !receipt.quorum_met() {
            warn!(
                node = %self.identity,
                key,
                acks,
                write_quorum = self.quorum.write,
                "Write quorum not reached; relying on gossip"
            );
        }
        Ok(receipt)
    }

    /// Read every live version of `key` across the read quorum.
    ///
    /// Concurrent versions are all returned; resolving them is the caller's
    /// job. Only peers that answer successfully count toward R.
    pub async fn get(&self, key: &str) -> NodeResult<VersionSet> {
        self.crash.ensure_available()?;

        let store = self.store.read().await;
        let mut versions = store.entries(key).cloned().unwrap_or_default();

        let mut reads = 1;
        let fanout = spans::fanout(&self.node_id, "S_Get", key);
        async {
            for peer in self.peers() {
                if reads >= self.quorum.read {
                    break;
                }
                let call = self.transport.s_get(&peer, key);
                if let Ok(remote) = self.call_peer("S_Get", &peer, call).await {
                    versions = reconcile(&versions, &remote).versions;
                    reads += 1;
                }
            }
        }
        .instrument(fanout)
        .await;
        drop(store);

        if versions.is_empty() {
            debug!(node = %self.identity, key, reads, "GET found nothing");
            return Err(NodeError::NotFound(key.to_string()));
        }
        info!(node = %self.identity, key, reads, versions = versions.len(), "GET");
        Ok(versions)
    }

    // ------------------------------------------------------------------
    // Peer-only operations
    // ------------------------------------------------------------------

    /// Merge a version set replicated by another node.
    ///
    /// Returns whether anything was stored. No further fan-out.
    pub async fn s_put(&self, key: &str, entries: &[ObjectEntry]) -> NodeResult<bool> {
        self.crash.ensure_available()?;

        let merged = self.store.write().await.merge(key, entries);
        debug!(
            node = %self.identity,
            key,
            new_versions = merged.new_count,
            "S_PUT"
        );
        Ok(merged.changed())
    }

    /// The local version set for `key`.
    pub async fn s_get(&self, key: &str) -> NodeResult<VersionSet> {
        self.crash.ensure_available()?;

        match self.store.read().await.entries(key) {
            Some(versions) => Ok(versions.clone()),
            None => Err(NodeError::NotFound(key.to_string())),
        }
    }

    /// Merge a peer's full store, key by key.
    pub async fn s_gossip(&self, snapshot: &StoreSnapshot) -> NodeResult<()> {
        self.crash.ensure_available()?;

        let mut accepted = 0;
        {
            let mut store = self.store.write().await;
            for (key, entries) in snapshot {
                accepted += store.merge(key, entries).new_count;
            }
        }
        metrics::record_gossip_accepted(accepted);
        debug!(
            node = %self.identity,
            keys = snapshot.len(),
            new_versions = accepted,
            "S_GOSSIP"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Push the whole local store to every other node in the preference list.
    ///
    /// Returns how many peers accepted the push.
    pub async fn gossip(&self) -> NodeResult<usize> {
        self.crash.ensure_available()?;

        let snapshot = self.store.snapshot().await;
        let peers = self.peers();
        let mut reached = 0;
        let fanout = spans::fanout(&self.node_id, "S_Gossip", "*");
        async {
            for peer in &peers {
                let call = self.transport.s_gossip(peer, &snapshot);
                if self.call_peer("S_Gossip", peer, call).await.is_ok() {
                    reached += 1;
                }
            }
        }
        .instrument(fanout)
        .await;

        if reached < peers.len() {
            warn!(
                node = %self.identity,
                keys = snapshot.len(),
                reached,
                peers = peers.len(),
                "Gossip did not reach every peer"
            );
        } else {
            info!(node = %self.identity, keys = snapshot.len(), peers = reached, "GOSSIP");
        }
        Ok(reached)
    }

    /// Become unavailable for `seconds`. Fails if already crashed.
    pub fn crash(&self, seconds: u64) -> NodeResult<bool> {
        self.crash.crash(Duration::from_secs(seconds), &self.node_id)?;
        Ok(true)
    }

    /// Replace the preference list. Trusted; not validated.
    pub fn send_preference_list(&self, nodes: Vec<ReplicaIdentity>) {
        info!(
            node = %self.identity,
            list = ?nodes.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Preference list updated"
        );
        *self.preference_list.write() = nodes;
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Preference list without this node, in order.
    fn peers(&self) -> Vec<ReplicaIdentity> {
        self.preference_list
            .read()
            .iter()
            .filter(|node| **node != self.identity)
            .cloned()
            .collect()
    }

    /// Run one peer call under the RPC timeout. Failures are logged and
    /// counted, then handed back for the caller to skip.
    async fn call_peer<T, F>(
        &self,
        method: &'static str,
        peer: &ReplicaIdentity,
        call: F,
    ) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        let result = match tokio::time::timeout(self.rpc_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(peer.to_string())),
        };
        if let Err(e) = &result {
            metrics::record_peer_failure(method, e.error_code());
            debug!(
                node = %self.identity,
                peer = %peer,
                method,
                error = %e,
                "Peer did not contribute"
            );
        }
        result
    }
}

impl std::fmt::Debug for ReplicaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaNode")
            .field("identity", &self.identity)
            .field("node_id", &self.node_id)
            .field("quorum", &self.quorum)
            .field("crashed", &self.crash.is_crashed())
            .finish()
    }
}
