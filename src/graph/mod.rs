use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub mod builder;

pub use builder::{NetworkBuilder, build_network};

/// Synthetic event identifier. Event ids equal the petgraph node index.
pub type EventId = u32;

pub const START_EVENT: EventId = 0;

/// How the builder decides where activities converge on project finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishRule {
    /// Every activity gets its own end event; dangling end events are joined
    /// into one synthetic finish event with zero-weight merge edges.
    #[default]
    SinkDetection,
    /// Classic single-finish numbering: the second-to-last activity allocates
    /// the finish event and the last activity reuses it.
    Positional,
}

impl FinishRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishRule::SinkDetection => "sink",
            FinishRule::Positional => "positional",
        }
    }

}

impl FromStr for FinishRule {
    type Err = NetworkError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sink" | "sink_detection" => Ok(FinishRule::SinkDetection),
            "positional" => Ok(FinishRule::Positional),
            other => Err(NetworkError::invalid(format!("unknown finish rule '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    EmptyNetwork,
    InvalidNetwork(String),
    CycleDetected,
}

impl NetworkError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        NetworkError::InvalidNetwork(message.into())
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::EmptyNetwork => write!(f, "invalid activity network: no activities"),
            NetworkError::InvalidNetwork(message) => {
                write!(f, "invalid activity network: {message}")
            }
            NetworkError::CycleDetected => {
                write!(f, "invalid activity network: dependency cycle detected")
            }
        }
    }
}

impl std::error::Error for NetworkError {}

/// Edge payload. Activity edges carry the activity name; merge edges don't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub label: String,
    pub weight: f64,
    pub activity: Option<String>,
}

impl NetworkEdge {
    pub fn activity(name: &str, expected_time: f64) -> Self {
        Self {
            label: format!("{name} ({expected_time:.2})"),
            weight: expected_time,
            activity: Some(name.to_string()),
        }
    }

    pub fn merge() -> Self {
        Self {
            label: String::new(),
            weight: 0.0,
            activity: None,
        }
    }

    pub fn is_merge(&self) -> bool {
        self.activity.is_none()
    }
}

/// Where an activity sits in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEdge {
    pub start: EventId,
    pub end: EventId,
    pub edge: usize,
}

/// Bidirectional activity <-> edge lookup recorded while building.
#[derive(Debug, Clone, Default)]
pub struct NetworkIndex {
    order: Vec<String>,
    by_name: HashMap<String, ActivityEdge>,
    by_edge: HashMap<usize, String>,
}

impl NetworkIndex {
    pub(crate) fn insert(&mut self, name: &str, placement: ActivityEdge) {
        self.order.push(name.to_string());
        self.by_edge.insert(placement.edge, name.to_string());
        self.by_name.insert(name.to_string(), placement);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn placement(&self, name: &str) -> Option<ActivityEdge> {
        self.by_name.get(name).copied()
    }

    pub fn endpoints(&self, name: &str) -> Option<(EventId, EventId)> {
        self.by_name.get(name).map(|p| (p.start, p.end))
    }

    pub fn activity_for_edge(&self, edge: usize) -> Option<&str> {
        self.by_edge.get(&edge).map(String::as_str)
    }

    /// Activity names in build order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Activity-on-edge network produced by [`NetworkBuilder`].
#[derive(Debug, Clone)]
pub struct ActivityNetwork {
    pub(crate) graph: DiGraph<EventId, NetworkEdge>,
    pub(crate) index: NetworkIndex,
    pub(crate) finish: Option<EventId>,
    pub(crate) rule: FinishRule,
}

impl ActivityNetwork {
    pub fn graph(&self) -> &DiGraph<EventId, NetworkEdge> {
        &self.graph
    }

    pub fn index(&self) -> &NetworkIndex {
        &self.index
    }

    pub fn rule(&self) -> FinishRule {
        self.rule
    }

    pub fn start_event(&self) -> EventId {
        START_EVENT
    }

    /// Finish event fixed during construction, if the rule produced one.
    pub fn finish_event(&self) -> Option<EventId> {
        self.finish
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn events(&self) -> impl Iterator<Item = EventId> + '_ {
        self.graph.node_indices().map(|ix| self.graph[ix])
    }

    /// `(from, to, edge index, payload)` for every edge.
    pub fn edges(&self) -> impl Iterator<Item = (EventId, EventId, usize, &NetworkEdge)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()],
                self.graph[e.target()],
                e.id().index(),
                e.weight(),
            )
        })
    }

    pub fn edge(&self, edge: usize) -> Option<&NetworkEdge> {
        self.graph.edge_weight(EdgeIndex::new(edge))
    }

    /// Events with no outgoing edge.
    pub fn sinks(&self) -> Vec<EventId> {
        self.graph
            .externals(Direction::Outgoing)
            .map(|ix| self.graph[ix])
            .collect()
    }

    pub(crate) fn node(event: EventId) -> NodeIndex {
        NodeIndex::new(event as usize)
    }
}
