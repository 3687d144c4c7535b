//! Node failure tests: quorum under crash-stop failures and re-replication

use ringkv::common::{Address, NodeConfig, Outcome, SimConfig};
use ringkv::sim::Cluster;

fn cluster(nodes: usize) -> Cluster {
    let sim = SimConfig {
        nodes,
        ..SimConfig::default()
    };
    Cluster::new(NodeConfig::default(), &sim)
}

/// Replica set of `key` and a live node outside it
fn layout(cluster: &Cluster, key: &str) -> (Vec<Address>, Address) {
    let any = cluster.addresses()[0].clone();
    let replicas: Vec<Address> = cluster
        .node(&any)
        .unwrap()
        .ring()
        .find_nodes(key)
        .into_iter()
        .map(|n| n.address)
        .collect();
    let outsider = cluster
        .addresses()
        .into_iter()
        .find(|a| !replicas.contains(a))
        .unwrap();
    (replicas, outsider)
}

#[test]
fn test_single_replica_failure_keeps_quorum() {
    let mut cluster = cluster(6);
    let (replicas, coordinator) = layout(&cluster, "k");

    let tx = cluster.node_mut(&coordinator).unwrap().create("k", "v").unwrap();
    assert!(cluster.fail(&replicas[0]));
    cluster.run(3);

    let outcomes = cluster.audit().coordinator_outcomes(tx);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].outcome, Outcome::Success);
}

#[test]
fn test_two_replica_failures_time_out() {
    let mut cluster = cluster(6);
    let (replicas, coordinator) = layout(&cluster, "k");

    let tx = cluster.node_mut(&coordinator).unwrap().create("k", "v").unwrap();
    cluster.fail(&replicas[0]);
    cluster.fail(&replicas[1]);

    cluster.run(20);
    assert!(cluster.audit().coordinator_outcomes(tx).is_empty());
    assert!(cluster.node(&coordinator).unwrap().pending().contains(tx));

    cluster.run(1);
    let outcomes = cluster.audit().coordinator_outcomes(tx);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].outcome, Outcome::Failure);
    assert_eq!(outcomes[0].value.as_deref(), Some("v"));
    assert_eq!(
        cluster.node(&coordinator).unwrap().metrics().timeouts.get(),
        1
    );

    // Never reported twice
    cluster.run(30);
    assert_eq!(cluster.audit().coordinator_outcomes(tx).len(), 1);
}

#[test]
fn test_failure_re_replicates_to_new_replica_set() {
    let mut cluster = cluster(6);
    let writer = Address::new("1:0");
    for i in 0..20 {
        let key = format!("key_{}", i);
        cluster.node_mut(&writer).unwrap().create(&key, &format!("v{}", i)).unwrap();
    }
    cluster.run(3);

    assert!(cluster.fail(&Address::new("3:0")));
    cluster.run(5);

    for i in 0..20 {
        let key = format!("key_{}", i);
        let replicas = cluster.node(&writer).unwrap().ring().find_nodes(&key);
        assert_eq!(replicas.len(), 3);
        for replica in replicas {
            let node = cluster.node(&replica.address).unwrap();
            assert_eq!(
                node.store().read(&key),
                Some(format!("v{}", i)),
                "{} missing on {}",
                key,
                replica.address
            );
        }
    }

    let tx = cluster.node_mut(&writer).unwrap().read("key_7").unwrap();
    cluster.run(3);
    let outcomes = cluster.audit().coordinator_outcomes(tx);
    assert_eq!(outcomes[0].outcome, Outcome::Success);
    assert_eq!(outcomes[0].value.as_deref(), Some("v7"));
}

#[test]
fn test_shrinking_below_three_nodes_rejects_requests() {
    let mut cluster = cluster(3);
    cluster.fail(&Address::new("3:0"));
    cluster.tick();

    let node = Address::new("1:0");
    assert!(cluster.node_mut(&node).unwrap().read("k").is_err());
    assert_eq!(cluster.node(&node).unwrap().ring().len(), 2);
}
