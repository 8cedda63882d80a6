//! Connection - serves RPCs arriving on one TCP stream.
//!
//! Requests are answered strictly in order; a connection may carry any
//! number of request/reply pairs. [`dispatch`] maps each typed request onto
//! the matching [`ReplicaNode`] method.

use crate::metrics;
use crate::node::ReplicaNode;
use crate::telemetry::{OperationTimer, spans};
use dynamo_proto::{JsonLinesCodec, ProtocolError, Reply, Request, Response, RpcError};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, warn};

pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    node: Arc<ReplicaNode>,
}

impl Connection {
    pub fn new(stream: TcpStream, addr: SocketAddr, node: Arc<ReplicaNode>) -> Self {
        Self { stream, addr, node }
    }

    /// Answer requests until the peer hangs up or sends garbage.
    pub async fn run(self) -> Result<(), ProtocolError> {
        let addr = self.addr;
        let mut framed = Framed::new(self.stream, JsonLinesCodec::<Request, Reply>::new());

        while let Some(frame) = framed.next().await {
            match frame {
                Ok(request) => {
                    let reply = dispatch(&self.node, request).await;
                    framed.send(reply).await?;
                }
                Err(ProtocolError::Io(e)) => return Err(ProtocolError::Io(e)),
                Err(e) => {
                    warn!(%addr, error = %e, "Malformed RPC frame");
                    framed.send(Err(RpcError::BadRequest(e.to_string()))).await?;
                    return Ok(());
                }
            }
        }
        debug!(%addr, "RPC connection closed");
        Ok(())
    }
}

/// Execute one request against `node`.
pub async fn dispatch(node: &ReplicaNode, request: Request) -> Reply {
    let method = request.method();
    let _timer = OperationTimer::new(method);

    let reply = async {
        match request {
            Request::Put {
                key,
                context,
                value,
            } => node.put(&key, context, value).await.map(|_| Response::Put(true)),
            Request::Get { key } => node.get(&key).await.map(Response::Get),
            Request::SPut { key, entries } => node.s_put(&key, &entries).await.map(Response::SPut),
            Request::SGet { key } => node.s_get(&key).await.map(Response::SGet),
            Request::SGossip { store } => node.s_gossip(&store).await.map(|()| Response::SGossip),
            Request::Gossip => node.gossip().await.map(|_| Response::Gossip),
            Request::Crash { seconds } => node.crash(seconds).map(Response::Crash),
            Request::SendPreferenceList { nodes } => {
                node.send_preference_list(nodes);
                Ok(Response::SendPreferenceList)
            }
        }
    }
    .instrument(spans::rpc(node.node_id(), method))
    .await;

    match &reply {
        Ok(_) => metrics::record_request(method, "ok"),
        Err(e) => metrics::record_request(method, e.error_code()),
    }
    reply.map_err(RpcError::from)
}
