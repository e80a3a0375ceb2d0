use crate::graph::{ActivityNetwork, EventId, NetworkError};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashSet};

pub struct BackwardPass<'a> {
    network: &'a ActivityNetwork,
    order: &'a [NodeIndex],
    earliest: &'a BTreeMap<EventId, f64>,
    critical: &'a HashSet<EventId>,
}

impl<'a> BackwardPass<'a> {
    pub fn new(
        network: &'a ActivityNetwork,
        order: &'a [NodeIndex],
        earliest: &'a BTreeMap<EventId, f64>,
        critical: &'a HashSet<EventId>,
    ) -> Self {
        Self {
            network,
            order,
            earliest,
            critical,
        }
    }

    /// Latest occurrence times. Critical events (the finish included) take
    /// `L = E` as stored by the forward pass; every other event takes the
    /// minimum over its successors. Events that cannot reach the finish stay
    /// at `+inf`.
    pub fn execute(&self) -> Result<BTreeMap<EventId, f64>, NetworkError> {
        let graph = self.network.graph();
        let mut latest: BTreeMap<EventId, f64> = self
            .network
            .events()
            .map(|e| (e, f64::INFINITY))
            .collect();

        for &node_ix in self.order.iter().rev() {
            let event = graph[node_ix];
            if self.critical.contains(&event) {
                let early = self.earliest.get(&event).copied().ok_or_else(|| {
                    NetworkError::invalid(format!("event {event} missing from forward pass"))
                })?;
                latest.insert(event, early);
                continue;
            }
            let mut bound = f64::INFINITY;
            for edge in graph.edges(node_ix) {
                let neighbor = graph[edge.target()];
                let successor_latest = latest.get(&neighbor).copied().ok_or_else(|| {
                    NetworkError::invalid(format!("event {neighbor} missing from network"))
                })?;
                bound = bound.min(successor_latest - edge.weight().weight);
            }
            latest.insert(event, bound);
        }

        Ok(latest)
    }
}
