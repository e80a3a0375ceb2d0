use super::backward_pass::BackwardPass;
use super::forward_pass::ForwardPass;
use crate::graph::{ActivityNetwork, EventId, NetworkError};
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A zero-slack edge. `edge` is the network's edge index, used to map the
/// edge back to its activity without comparing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalEdge {
    pub from: EventId,
    pub to: EventId,
    pub weight: f64,
    pub edge: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalPathAnalysis {
    pub earliest: BTreeMap<EventId, f64>,
    pub latest: BTreeMap<EventId, f64>,
    pub critical_edges: Vec<CriticalEdge>,
    pub finish_event: EventId,
}

impl CriticalPathAnalysis {
    /// `E` of the finish event.
    pub fn project_duration(&self) -> f64 {
        self.earliest
            .get(&self.finish_event)
            .copied()
            .unwrap_or_default()
    }

    /// `L[to] - (E[from] + weight)`, or `None` for unknown events. The sum is
    /// formed the way the forward pass forms it, so critical edges give
    /// exactly `0.0`.
    pub fn slack(&self, from: EventId, to: EventId, weight: f64) -> Option<f64> {
        let early = self.earliest.get(&from)?;
        let late = self.latest.get(&to)?;
        Some(late - (early + weight))
    }

    pub fn is_critical_edge(&self, edge: usize) -> bool {
        self.critical_edges.iter().any(|c| c.edge == edge)
    }
}

/// Forward and backward passes over the network followed by zero-slack edge
/// extraction. Critical edges may form several parallel chains.
pub fn compute_critical_path(
    network: &ActivityNetwork,
) -> Result<CriticalPathAnalysis, NetworkError> {
    if network.index().is_empty() {
        return Err(NetworkError::EmptyNetwork);
    }
    let graph = network.graph();
    let order = toposort(graph, None).map_err(|_| NetworkError::CycleDetected)?;

    let earliest = ForwardPass::new(network, &order).execute()?;
    let finish_event = latest_finishing_event(network, &earliest)?;
    let finish_time = earliest[&finish_event];
    let (critical_events, critical_edges) =
        tight_edges(network, &order, &earliest, finish_event)?;
    let latest =
        BackwardPass::new(network, &order, &earliest, &critical_events).execute()?;

    debug!(
        finish_event,
        duration = finish_time,
        critical = critical_edges.len(),
        "critical path computed"
    );

    Ok(CriticalPathAnalysis {
        earliest,
        latest,
        critical_edges,
        finish_event,
    })
}

/// Zero-slack edges, found backwards from the finish event.
///
/// An edge `(u, v)` is critical when `v` is critical and `E[u] + w == E[v]`.
/// The forward pass stored `E[v]` from that very sum, so the comparison is
/// exact for any weights, while `L[v] - w - E[u]` is not once `te` has a
/// fractional part.
fn tight_edges(
    network: &ActivityNetwork,
    order: &[NodeIndex],
    earliest: &BTreeMap<EventId, f64>,
    finish: EventId,
) -> Result<(HashSet<EventId>, Vec<CriticalEdge>), NetworkError> {
    let graph = network.graph();
    let time = |event: EventId| {
        earliest.get(&event).copied().ok_or_else(|| {
            NetworkError::invalid(format!("event {event} missing from forward pass"))
        })
    };

    let mut critical_events = HashSet::from([finish]);
    let mut critical_edges = Vec::new();
    for &node_ix in order.iter().rev() {
        let from = graph[node_ix];
        let early = time(from)?;
        for edge in graph.edges(node_ix) {
            let to = graph[edge.target()];
            let weight = edge.weight().weight;
            if critical_events.contains(&to) && early + weight == time(to)? {
                critical_edges.push(CriticalEdge {
                    from,
                    to,
                    weight,
                    edge: edge.id().index(),
                });
                critical_events.insert(from);
            }
        }
    }
    critical_edges.sort_by_key(|c| c.edge);
    Ok((critical_events, critical_edges))
}

/// Event with the largest `E`. Ties go to events without outgoing edges, then
/// to the highest event id.
fn latest_finishing_event(
    network: &ActivityNetwork,
    earliest: &BTreeMap<EventId, f64>,
) -> Result<EventId, NetworkError> {
    let graph = network.graph();
    let rank = |event: EventId| {
        let is_sink = graph
            .neighbors_directed(ActivityNetwork::node(event), Direction::Outgoing)
            .next()
            .is_none();
        (earliest[&event], is_sink, event)
    };
    network
        .events()
        .map(rank)
        .max_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        })
        .map(|(_, _, event)| event)
        .ok_or(NetworkError::EmptyNetwork)
}
