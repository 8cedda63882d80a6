//! Replica addressing and preference lists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identity of a replica: where its RPC endpoint listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplicaIdentity {
    pub address: String,
    pub port: u16,
}

impl ReplicaIdentity {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// `host:port` form suitable for `TcpStream::connect`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReplicaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Rotate a preference list left by one position.
///
/// Giving each node the canonical ring rotated by its index yields a
/// distinct list per node, each starting at a different ring position.
#[must_use]
pub fn rotate_preference_list(list: &[ReplicaIdentity]) -> Vec<ReplicaIdentity> {
    let mut rotated = list.to_vec();
    if !rotated.is_empty() {
        rotated.rotate_left(1);
    }
    rotated
}

/// The canonical ring rotated `index` times.
#[must_use]
pub fn preference_list_for(canonical: &[ReplicaIdentity], index: usize) -> Vec<ReplicaIdentity> {
    let mut list = canonical.to_vec();
    if !list.is_empty() {
        list.rotate_left(index % canonical.len());
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Vec<ReplicaIdentity> {
        (0..3).map(|i| ReplicaIdentity::new("127.0.0.1", 7000 + i)).collect()
    }

    #[test]
    fn test_rotate_by_one() {
        let rotated = rotate_preference_list(&ring());
        let ports: Vec<u16> = rotated.iter().map(|n| n.port).collect();
        assert_eq!(ports, vec![7001, 7002, 7000]);
        assert!(rotate_preference_list(&[]).is_empty());
    }

    #[test]
    fn test_each_index_starts_at_itself() {
        let ring = ring();
        for (i, node) in ring.iter().enumerate() {
            let list = preference_list_for(&ring, i);
            assert_eq!(&list[0], node);
            assert_eq!(list.len(), ring.len());
        }
        assert_eq!(preference_list_for(&ring, 4), preference_list_for(&ring, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(ReplicaIdentity::new("localhost", 8080).to_string(), "localhost:8080");
    }
}
