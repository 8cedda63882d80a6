//! Gateway - TCP listener that accepts RPC connections for one replica.
//!
//! The Gateway binds the replica's endpoint and spawns a Connection task
//! for each incoming peer or client.

use crate::network::Connection;
use crate::node::ReplicaNode;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    node: Arc<ReplicaNode>,
}

impl Gateway {
    /// Bind to the node's own `address:port`.
    pub async fn bind(node: Arc<ReplicaNode>) -> std::io::Result<Self> {
        let identity = node.identity();
        let listener = TcpListener::bind((identity.address.as_str(), identity.port)).await?;
        info!(node = %node.identity(), "RPC listener bound");
        Ok(Self { listener, node })
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, node: Arc<ReplicaNode>) -> Self {
        Self { listener, node }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let node = Arc::clone(&self.node);
                    tokio::spawn(async move {
                        if let Err(e) = Connection::new(stream, addr, node).run().await {
                            error!(%addr, error = %e, "RPC connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept RPC connection");
                }
            }
        }
    }
}
