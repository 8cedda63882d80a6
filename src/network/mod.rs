//! Network module.
//!
//! Contains the Gateway (TCP listener), Connection handler and request
//! dispatch, the typed client, and the peer transports used for fan-out.

mod client;
mod connection;
mod gateway;
mod local;
mod transport;

pub use client::{DEFAULT_CALL_TIMEOUT, DynamoClient};
pub use connection::{Connection, dispatch};
pub use gateway::Gateway;
pub use local::LocalTransport;
pub use transport::{PeerTransport, TcpTransport};
