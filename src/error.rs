//! Unified error handling for the replica node.
//!
//! Node operations fail with a [`NodeError`]; peer calls fail with a
//! [`TransportError`]. Transport failures never escape a quorum walk: a peer
//! that cannot be reached simply does not contribute.

use dynamo_proto::{ProtocolError, RpcError};
use thiserror::Error;

// ============================================================================
// Node Errors (store operations)
// ============================================================================

/// Errors returned by [`crate::node::ReplicaNode`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The node is administratively unavailable. Fatal to this call only.
    #[error("server crashed")]
    ServerCrash,

    /// The written version adds nothing to what the node already holds.
    #[error("object version out of date")]
    StaleVersion,

    #[error("no such value: {0}")]
    NotFound(String),
}

impl NodeError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServerCrash => "server_crash",
            Self::StaleVersion => "stale_version",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl From<NodeError> for RpcError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::ServerCrash => RpcError::ServerCrash,
            NodeError::StaleVersion => RpcError::StaleVersion,
            NodeError::NotFound(_) => RpcError::NotFound,
        }
    }
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

// ============================================================================
// Transport Errors (peer calls)
// ============================================================================

/// Failure of a single call to another node.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {peer} unreachable: {source}")]
    Unreachable {
        peer: String,
        #[source]
        source: std::io::Error,
    },

    #[error("peer {0} did not answer in time")]
    Timeout(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection closed before a reply arrived")]
    Closed,

    #[error("remote error: {0}")]
    Remote(#[from] RpcError),

    #[error("unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

impl TransportError {
    /// Static label for metrics.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::Timeout(_) => "timeout",
            Self::Protocol(_) => "protocol",
            Self::Closed => "closed",
            Self::Remote(RpcError::ServerCrash) => "server_crash",
            Self::Remote(RpcError::StaleVersion) => "stale_version",
            Self::Remote(RpcError::NotFound) => "not_found",
            Self::Remote(RpcError::BadRequest(_)) => "bad_request",
            Self::UnexpectedReply(_) => "unexpected_reply",
        }
    }
}
