//! Typed RPC surface of a replica.
//!
//! Every call is a [`Request`] answered by a [`Reply`]. Methods prefixed
//! with `S` are peer-only: a node issues them to other nodes while
//! replicating, reading a quorum, or gossiping.

use crate::entry::{Context, StoreSnapshot, VersionSet};
use crate::error::ProtocolError;
use crate::identity::ReplicaIdentity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    /// Client write; the serving node stamps the context and fans out.
    Put {
        key: String,
        context: Context,
        #[serde(with = "crate::entry::base64_value")]
        value: Vec<u8>,
    },
    /// Client read across the read quorum.
    Get { key: String },
    /// Replicate a merged version set for one key.
    SPut { key: String, entries: VersionSet },
    /// Read the local version set for one key.
    SGet { key: String },
    /// Merge a full store snapshot.
    SGossip { store: StoreSnapshot },
    /// Push the local store to every peer.
    Gossip,
    /// Become unavailable for `seconds`.
    Crash { seconds: u64 },
    /// Replace the preference list.
    SendPreferenceList { nodes: Vec<ReplicaIdentity> },
}

impl Request {
    /// Method name, for logs and metric labels.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Put { .. } => "Put",
            Self::Get { .. } => "Get",
            Self::SPut { .. } => "S_Put",
            Self::SGet { .. } => "S_Get",
            Self::SGossip { .. } => "S_Gossip",
            Self::Gossip => "Gossip",
            Self::Crash { .. } => "Crash",
            Self::SendPreferenceList { .. } => "SendPreferenceList",
        }
    }
}

/// Successful reply bodies, one per [`Request`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "result")]
pub enum Response {
    Put(bool),
    Get(VersionSet),
    SPut(bool),
    SGet(VersionSet),
    SGossip,
    Gossip,
    Crash(bool),
    SendPreferenceList,
}

/// Failure outcome of a call, kept apart from any reply body.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RpcError {
    #[error("server crashed")]
    ServerCrash,
    #[error("object version out of date")]
    StaleVersion,
    #[error("no such value")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type Reply = Result<Response, RpcError>;

/// Bytes reserved for the `SGossip` envelope around the store map.
const GOSSIP_ENVELOPE_LEN: usize = 64;

/// Split `store` into snapshots whose `SGossip` requests each encode to at
/// most `max_frame` bytes.
///
/// Keys are never split across batches. A key whose versions alone do not
/// fit fails with [`ProtocolError::FrameTooLong`]. An empty store yields a
/// single empty batch.
pub fn gossip_batches(
    store: &StoreSnapshot,
    max_frame: usize,
) -> Result<Vec<StoreSnapshot>, ProtocolError> {
    let budget = max_frame.saturating_sub(GOSSIP_ENVELOPE_LEN);
    let mut batches = Vec::new();
    let mut current = StoreSnapshot::new();
    let mut used = 0;

    for (key, versions) in store {
        // `"key":[...]` plus a separating comma.
        let len = serde_json::to_string(key)?.len() + serde_json::to_string(versions)?.len() + 2;
        if len > budget {
            return Err(ProtocolError::FrameTooLong { max: max_frame });
        }
        if used + len > budget && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            used = 0;
        }
        used += len;
        current.insert(key.clone(), versions.clone());
    }

    if !current.is_empty() || batches.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}
