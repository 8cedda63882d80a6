//! Typed RPC client for a single replica.
//!
//! Each call opens a fresh TCP connection, sends one request, waits for one
//! reply, and hangs up. The whole exchange, connect included, is bounded by
//! the client's timeout.

use crate::error::TransportError;
use dynamo_proto::{
    Context, JsonLinesCodec, MAX_FRAME_LEN, ObjectEntry, Reply, ReplicaIdentity, Request,
    Response, StoreSnapshot, VersionSet, gossip_batches,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// Bound on a whole client call unless overridden.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct DynamoClient {
    endpoint: String,
    timeout: Duration,
}

impl DynamoClient {
    /// Client for `host:port`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn for_replica(replica: &ReplicaIdentity) -> Self {
        Self::new(replica.endpoint())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and wait for its reply.
    pub async fn call(&self, request: Request) -> Result<Response, TransportError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.endpoint.clone())),
        }
    }

    async fn exchange(&self, request: Request) -> Result<Response, TransportError> {
        let stream = TcpStream::connect(&self.endpoint)
            .await
            .map_err(|source| TransportError::Unreachable {
                peer: self.endpoint.clone(),
                source,
            })?;
        let mut framed = Framed::new(stream, JsonLinesCodec::<Reply, Request>::new());
        framed.send(request).await?;
        match framed.next().await {
            Some(reply) => Ok(reply??),
            None => Err(TransportError::Closed),
        }
    }

    // ------------------------------------------------------------------
    // Client entry points
    // ------------------------------------------------------------------

    pub async fn put(
        &self,
        key: &str,
        context: Context,
        value: impl Into<Vec<u8>>,
    ) -> Result<bool, TransportError> {
        let request = Request::Put {
            key: key.to_string(),
            context,
            value: value.into(),
        };
        match self.call(request).await? {
            Response::Put(ok) => Ok(ok),
            _ => Err(TransportError::UnexpectedReply("Put")),
        }
    }

    pub async fn get(&self, key: &str) -> Result<VersionSet, TransportError> {
        match self.call(Request::Get { key: key.to_string() }).await? {
            Response::Get(versions) => Ok(versions),
            _ => Err(TransportError::UnexpectedReply("Get")),
        }
    }

    // ------------------------------------------------------------------
    // Peer-only
    // ------------------------------------------------------------------

    pub async fn s_put(&self, key: &str, entries: &[ObjectEntry]) -> Result<bool, TransportError> {
        let request = Request::SPut {
            key: key.to_string(),
            entries: entries.to_vec(),
        };
        match self.call(request).await? {
            Response::SPut(stored) => Ok(stored),
            _ => Err(TransportError::UnexpectedReply("S_Put")),
        }
    }

    pub async fn s_get(&self, key: &str) -> Result<VersionSet, TransportError> {
        match self.call(Request::SGet { key: key.to_string() }).await? {
            Response::SGet(versions) => Ok(versions),
            _ => Err(TransportError::UnexpectedReply("S_Get")),
        }
    }

    /// Push `store`, split into as many `SGossip` frames as the frame limit
    /// requires. Batches are merged key by key on arrival, so a push that
    /// fails part way leaves the peer with a consistent subset.
    pub async fn s_gossip(&self, store: &StoreSnapshot) -> Result<(), TransportError> {
        for batch in gossip_batches(store, MAX_FRAME_LEN)? {
            match self.call(Request::SGossip { store: batch }).await? {
                Response::SGossip => {}
                _ => return Err(TransportError::UnexpectedReply("S_Gossip")),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub async fn gossip(&self) -> Result<(), TransportError> {
        match self.call(Request::Gossip).await? {
            Response::Gossip => Ok(()),
            _ => Err(TransportError::UnexpectedReply("Gossip")),
        }
    }

    pub async fn crash(&self, seconds: u64) -> Result<bool, TransportError> {
        match self.call(Request::Crash { seconds }).await? {
            Response::Crash(ok) => Ok(ok),
            _ => Err(TransportError::UnexpectedReply("Crash")),
        }
    }

    pub async fn send_preference_list(
        &self,
        nodes: Vec<ReplicaIdentity>,
    ) -> Result<(), TransportError> {
        match self.call(Request::SendPreferenceList { nodes }).await? {
            Response::SendPreferenceList => Ok(()),
            _ => Err(TransportError::UnexpectedReply("SendPreferenceList")),
        }
    }
}
