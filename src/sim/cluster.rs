//! Lockstep cluster of simulated nodes

use crate::common::{
    Address, AuditEvent, AuditSink, MemStore, MemoryAudit, NodeConfig, Operation, SimConfig,
    TransactionId, TransactionIds,
};
use crate::net::{SharedMembership, SimNetwork};
use crate::node::Node;
use crate::sim::Summary;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Records into the cluster's in-memory log and, optionally, a second sink
struct TeeAudit {
    memory: Arc<MemoryAudit>,
    extra: Option<Arc<dyn AuditSink>>,
}

impl AuditSink for TeeAudit {
    fn record(&self, event: AuditEvent) {
        if let Some(extra) = &self.extra {
            extra.record(event.clone());
        }
        self.memory.record(event);
    }
}

/// A client operation accepted by some node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issued {
    pub node: Address,
    pub operation: Operation,
    pub key: String,
    pub transaction_id: TransactionId,
}

/// Nodes `1:0 .. N:0` sharing one network, membership list, audit log, and
/// transaction id source
pub struct Cluster {
    config: NodeConfig,
    net: Arc<SimNetwork>,
    membership: Arc<SharedMembership>,
    audit: Arc<MemoryAudit>,
    sink: Arc<dyn AuditSink>,
    txids: TransactionIds,
    nodes: BTreeMap<Address, Node>,
    next_id: u32,
    keys: Vec<String>,
    ticks: u64,
}

impl Cluster {
    pub fn new(config: NodeConfig, sim: &SimConfig) -> Self {
        Self::with_audit(config, sim, None)
    }

    /// Like [`Cluster::new`], also forwarding every audit event to `extra`
    pub fn with_audit(
        config: NodeConfig,
        sim: &SimConfig,
        extra: Option<Arc<dyn AuditSink>>,
    ) -> Self {
        let net = Arc::new(SimNetwork::new(sim.drop_rate, sim.reorder, sim.seed));
        let audit = Arc::new(MemoryAudit::new());
        let sink: Arc<dyn AuditSink> = Arc::new(TeeAudit {
            memory: audit.clone(),
            extra,
        });

        let mut cluster = Self {
            config,
            net,
            membership: Arc::new(SharedMembership::default()),
            audit,
            sink,
            txids: TransactionIds::new(),
            nodes: BTreeMap::new(),
            next_id: 1,
            keys: Vec::new(),
            ticks: 0,
        };

        let addresses: Vec<Address> = (0..sim.nodes).map(|_| cluster.allocate_address()).collect();
        for address in &addresses {
            cluster.membership.join(address.clone());
        }
        for address in addresses {
            cluster.spawn(address);
        }
        tracing::info!("Cluster started with {} nodes", cluster.nodes.len());
        cluster
    }

    /// Tick every live node once, in address order.
    ///
    /// Returns the number of messages processed cluster-wide.
    pub fn tick(&mut self) -> usize {
        self.ticks += 1;
        self.nodes.values_mut().map(|node| node.tick()).sum()
    }

    /// Tick `n` times
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Crash-stop `address`: its traffic is dropped, it leaves membership,
    /// and its state is discarded. Returns `false` if it was not live.
    pub fn fail(&mut self, address: &Address) -> bool {
        if self.nodes.remove(address).is_none() {
            return false;
        }
        self.net.fail(address);
        self.membership.leave(address);
        tracing::info!("Node {} failed", address);
        true
    }

    /// Add a fresh, empty node to the ring
    pub fn join(&mut self) -> Address {
        let address = self.allocate_address();
        self.membership.join(address.clone());
        self.spawn(address.clone());
        tracing::info!("Node {} joined", address);
        address
    }

    pub fn node(&self, address: &Address) -> Option<&Node> {
        self.nodes.get(address)
    }

    pub fn node_mut(&mut self, address: &Address) -> Option<&mut Node> {
        self.nodes.get_mut(address)
    }

    /// Live node addresses in ascending order
    pub fn addresses(&self) -> Vec<Address> {
        self.nodes.keys().cloned().collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn audit(&self) -> &MemoryAudit {
        &self.audit
    }

    pub fn network(&self) -> &SimNetwork {
        &self.net
    }

    /// Issue `ops` random client operations from random live nodes.
    ///
    /// Creates introduce new keys; the other operations mostly target keys
    /// created earlier. Operations a node rejects for lack of replicas are
    /// skipped.
    pub fn run_workload<R: Rng>(&mut self, rng: &mut R, ops: usize) -> Vec<Issued> {
        let mut issued = Vec::with_capacity(ops);
        if self.nodes.is_empty() {
            return issued;
        }

        for _ in 0..ops {
            let idx = rng.gen_range(0..self.nodes.len());
            let Some(address) = self.nodes.keys().nth(idx).cloned() else {
                continue;
            };

            let operation = if self.keys.is_empty() {
                Operation::Create
            } else {
                match rng.gen_range(0..10) {
                    0..=3 => Operation::Create,
                    4..=6 => Operation::Read,
                    7..=8 => Operation::Update,
                    _ => Operation::Delete,
                }
            };
            let key = match operation {
                Operation::Create => format!("key_{}", self.keys.len()),
                _ => self.keys[rng.gen_range(0..self.keys.len())].clone(),
            };
            let value = format!("value_{}", rng.gen_range(0..1000));

            let Some(node) = self.nodes.get_mut(&address) else {
                continue;
            };
            let result = match operation {
                Operation::Create => node.create(&key, &value),
                Operation::Read => node.read(&key),
                Operation::Update => node.update(&key, &value),
                Operation::Delete => node.delete(&key),
            };
            match result {
                Ok(transaction_id) => {
                    if operation == Operation::Create {
                        self.keys.push(key.clone());
                    }
                    issued.push(Issued {
                        node: address,
                        operation,
                        key,
                        transaction_id,
                    });
                }
                Err(e) => tracing::debug!("{} {} {:?} rejected: {}", address, operation, key, e),
            }
        }
        issued
    }

    /// Outcome totals so far
    pub fn summary(&self) -> Summary {
        Summary::collect(self.ticks, self.nodes.len(), &self.audit, self.net.stats())
    }

    /// Prometheus text for every live node
    pub fn metrics_text(&self) -> String {
        self.nodes
            .values()
            .map(|node| node.metrics().to_prometheus(node.address().as_str()))
            .collect()
    }

    fn allocate_address(&mut self) -> Address {
        let address = Address::new(format!("{}:0", self.next_id));
        self.next_id += 1;
        address
    }

    fn spawn(&mut self, address: Address) {
        let node = Node::new(
            address.clone(),
            &self.config,
            self.txids.clone(),
            self.net.clone(),
            self.membership.clone(),
            self.sink.clone(),
            Box::new(MemStore::new()),
        );
        self.nodes.insert(address, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Origin, Outcome};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sim(nodes: usize) -> SimConfig {
        SimConfig {
            nodes,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_addresses_assigned_sequentially() {
        let cluster = Cluster::new(NodeConfig::default(), &sim(3));
        assert_eq!(
            cluster.addresses(),
            vec![Address::new("1:0"), Address::new("2:0"), Address::new("3:0")]
        );
        for node in cluster.nodes() {
            assert_eq!(node.ring().len(), 3);
        }
    }

    #[test]
    fn test_fail_and_join() {
        let mut cluster = Cluster::new(NodeConfig::default(), &sim(4));
        assert!(cluster.fail(&Address::new("2:0")));
        assert!(!cluster.fail(&Address::new("2:0")));
        assert!(cluster.node(&Address::new("2:0")).is_none());

        let joined = cluster.join();
        assert_eq!(joined, Address::new("5:0"));
        cluster.tick();
        for node in cluster.nodes() {
            assert_eq!(node.ring().len(), 4);
        }
    }

    #[test]
    fn test_workload_resolves_on_reliable_network() {
        let mut cluster = Cluster::new(NodeConfig::default(), &sim(5));
        let mut rng = StdRng::seed_from_u64(7);
        let issued = cluster.run_workload(&mut rng, 20);
        assert_eq!(issued.len(), 20);
        assert_eq!(issued[0].operation, Operation::Create);

        cluster.run(5);
        for op in &issued {
            let outcomes = cluster.audit().coordinator_outcomes(op.transaction_id);
            assert_eq!(outcomes.len(), 1, "{:?}", op);
            assert_eq!(outcomes[0].node, op.node);
        }
        assert_eq!(
            cluster.audit().count(Origin::Coordinator, Operation::Create, Outcome::Failure),
            0
        );
    }

    #[test]
    fn test_extra_audit_sink_receives_events() {
        let extra = Arc::new(MemoryAudit::new());
        let mut cluster = Cluster::with_audit(
            NodeConfig::default(),
            &sim(3),
            Some(extra.clone() as Arc<dyn AuditSink>),
        );
        let node = Address::new("1:0");
        cluster.node_mut(&node).unwrap().create("k", "v").unwrap();
        cluster.run(3);
        assert_eq!(extra.events().len(), cluster.audit().events().len());
        assert!(!extra.events().is_empty());
    }
}
