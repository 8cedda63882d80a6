//! Quorum write and read behavior across an in-process cluster.

mod common;

use common::TestCluster;
use dynamo_kv::NodeError;
use dynamo_proto::{Context, VectorClock};

#[tokio::test]
async fn test_single_node_put_get() {
    let cluster = TestCluster::new(1, 1, 1);
    let node = cluster.node(0);

    let receipt = node.put("a", Context::default(), b"v1".to_vec()).await.unwrap();
    assert!(receipt.quorum_met());

    let versions = node.get("a").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].value, b"v1");
}

#[tokio::test]
async fn test_put_replicates_until_write_quorum() {
    let cluster = TestCluster::new(3, 2, 1);

    let receipt = cluster
        .node(0)
        .put("k", Context::default(), b"v".to_vec())
        .await
        .unwrap();
    assert_eq!(receipt.acks, 2);

    // n1 walks its list in order, so n2 got the write and n3 did not.
    assert_eq!(cluster.node(1).s_get("k").await.unwrap().len(), 1);
    assert_eq!(
        cluster.node(2).s_get("k").await,
        Err(NodeError::NotFound("k".into()))
    );
}

#[tokio::test]
async fn test_put_skips_unreachable_peer() {
    let cluster = TestCluster::new(3, 2, 1);
    cluster.partition(1);

    let receipt = cluster
        .node(0)
        .put("k", Context::default(), b"v".to_vec())
        .await
        .unwrap();
    assert_eq!(receipt.acks, 2);
    assert!(cluster.node(2).s_get("k").await.is_ok());
}

#[tokio::test]
async fn test_put_skips_crashed_peer() {
    let cluster = TestCluster::new(3, 3, 1);
    cluster.node(1).crash(60).unwrap();

    let receipt = cluster
        .node(0)
        .put("k", Context::default(), b"v".to_vec())
        .await
        .unwrap();
    assert_eq!(receipt.acks, 2);
    assert!(!receipt.quorum_met());
}

/// A Put whose peers are all gone still succeeds once the local merge is
/// stored. The receipt reports the shortfall; durability is left to gossip.
#[tokio::test]
async fn test_put_succeeds_with_every_peer_down() {
    let cluster = TestCluster::new(3, 3, 1);
    cluster.partition(1);
    cluster.partition(2);

    let receipt = cluster
        .node(0)
        .put("k", Context::default(), b"lonely".to_vec())
        .await
        .unwrap();
    assert_eq!(receipt.acks, 1);
    assert_eq!(receipt.write_quorum, 3);
    assert!(!receipt.quorum_met());
    assert_eq!(cluster.node(0).get("k").await.unwrap()[0].value, b"lonely");

    cluster.heal(1);
    cluster.heal(2);
    cluster.node(0).gossip().await.unwrap();
    assert!(cluster.node(2).s_get("k").await.is_ok());
}

#[tokio::test]
async fn test_get_reads_from_peers() {
    let cluster = TestCluster::new(3, 1, 3);

    cluster
        .node(2)
        .put("k", Context::default(), b"remote".to_vec())
        .await
        .unwrap();

    let versions = cluster.node(0).get("k").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].value, b"remote");
    assert_eq!(versions[0].context.clock, VectorClock::preset([("n3", 1)]));
}

#[tokio::test]
async fn test_get_stops_at_read_quorum() {
    let cluster = TestCluster::new(3, 1, 2);

    cluster
        .node(1)
        .put("k", Context::default(), b"from-n2".to_vec())
        .await
        .unwrap();
    cluster
        .node(2)
        .put("k", Context::default(), b"from-n3".to_vec())
        .await
        .unwrap();

    // n1 reads itself and n2, then stops.
    let versions = cluster.node(0).get("k").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].value, b"from-n2");
}

#[tokio::test]
async fn test_get_missing_everywhere() {
    let cluster = TestCluster::new(3, 1, 3);
    assert_eq!(
        cluster.node(0).get("ghost").await,
        Err(NodeError::NotFound("ghost".into()))
    );
}

#[tokio::test]
async fn test_read_modify_write_supersedes_all_versions() {
    let cluster = TestCluster::new(2, 1, 1);
    let (a, b) = (cluster.node(0), cluster.node(1));

    a.put("k", Context::default(), b"v1".to_vec()).await.unwrap();
    b.put("k", Context::default(), b"v2".to_vec()).await.unwrap();
    cluster.gossip_all().await;

    let siblings = a.get("k").await.unwrap();
    assert_eq!(siblings.len(), 2);

    a.put("k", Context::combined(&siblings), b"merged".to_vec())
        .await
        .unwrap();
    a.gossip().await.unwrap();

    for node in &cluster.nodes {
        let versions = node.get("k").await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].value, b"merged");
        assert_eq!(
            versions[0].context.clock,
            VectorClock::preset([("n1", 2), ("n2", 1)])
        );
    }
}

#[tokio::test]
async fn test_stale_put_leaves_store_unchanged() {
    let cluster = TestCluster::new(1, 1, 1);
    let node = cluster.node(0);

    node.put("k", Context::default(), b"first".to_vec()).await.unwrap();
    assert_eq!(
        node.put("k", Context::default(), b"second".to_vec()).await,
        Err(NodeError::StaleVersion)
    );

    let versions = node.get("k").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].value, b"first");
}
