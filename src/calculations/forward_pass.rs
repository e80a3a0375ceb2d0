use crate::graph::{ActivityNetwork, EventId, NetworkError};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// Earliest occurrence time of every event, relaxed in topological order
/// starting from zero everywhere.
pub struct ForwardPass<'a> {
    network: &'a ActivityNetwork,
    order: &'a [NodeIndex],
}

impl<'a> ForwardPass<'a> {
    pub fn new(network: &'a ActivityNetwork, order: &'a [NodeIndex]) -> Self {
        Self { network, order }
    }

    pub fn execute(&self) -> Result<BTreeMap<EventId, f64>, NetworkError> {
        let graph = self.network.graph();
        let mut earliest: BTreeMap<EventId, f64> = self.network.events().map(|e| (e, 0.0)).collect();

        for &node_ix in self.order {
            let event = graph[node_ix];
            let from = earliest[&event];
            for edge in graph.edges(node_ix) {
                let neighbor = graph[edge.target()];
                let candidate = from + edge.weight().weight;
                let slot = earliest.get_mut(&neighbor).ok_or_else(|| {
                    NetworkError::invalid(format!("event {neighbor} missing from network"))
                })?;
                if candidate > *slot {
                    *slot = candidate;
                }
            }
        }

        Ok(earliest)
    }
}
