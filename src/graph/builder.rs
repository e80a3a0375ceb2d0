use super::{
    ActivityEdge, ActivityNetwork, EventId, FinishRule, NetworkEdge, NetworkError, NetworkIndex,
    START_EVENT,
};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use tracing::debug;

/// Builds an activity-on-edge network from an ordered activity list.
///
/// Event ids are allocated from `next_id`, owned by the builder, so separate
/// builds never share numbering state.
pub struct NetworkBuilder {
    rule: FinishRule,
    graph: DiGraph<EventId, NetworkEdge>,
    index: NetworkIndex,
    next_id: EventId,
}

impl NetworkBuilder {
    pub fn new(rule: FinishRule) -> Self {
        let mut graph = DiGraph::new();
        graph.add_node(START_EVENT);
        Self {
            rule,
            graph,
            index: NetworkIndex::default(),
            next_id: START_EVENT + 1,
        }
    }

    /// `activities` and `predecessors` are parallel lists; every predecessor
    /// must appear earlier in `activities` than its dependent.
    pub fn build(
        mut self,
        activities: &[String],
        predecessors: &[Vec<String>],
        expected_times: &HashMap<String, f64>,
    ) -> Result<ActivityNetwork, NetworkError> {
        if activities.is_empty() {
            return Err(NetworkError::EmptyNetwork);
        }
        if predecessors.len() != activities.len() {
            return Err(NetworkError::invalid(format!(
                "{} activities but {} predecessor lists",
                activities.len(),
                predecessors.len()
            )));
        }

        let count = activities.len();
        let mut final_event: Option<EventId> = None;

        for (position, name) in activities.iter().enumerate() {
            if self.index.contains(name) {
                return Err(NetworkError::invalid(format!(
                    "activity {name} is listed more than once"
                )));
            }
            let te = *expected_times.get(name).ok_or_else(|| {
                NetworkError::invalid(format!("no expected time for activity {name}"))
            })?;
            let preds = &predecessors[position];

            let (start, end) = if preds.is_empty() {
                if self.rule == FinishRule::Positional && count >= 2 && position + 2 >= count {
                    return Err(NetworkError::invalid(format!(
                        "activity {name} has no predecessors but must converge on project finish"
                    )));
                }
                (START_EVENT, self.allocate_event())
            } else {
                let start = self.shared_start(name, preds)?;
                let end = match self.rule {
                    FinishRule::SinkDetection => self.allocate_event(),
                    FinishRule::Positional if position + 2 == count => {
                        let event = self.allocate_event();
                        final_event = Some(event);
                        event
                    }
                    FinishRule::Positional if position + 1 == count => {
                        final_event.ok_or_else(|| {
                            NetworkError::invalid("no finish event allocated for the last activity")
                        })?
                    }
                    FinishRule::Positional => self.allocate_event(),
                };
                (start, end)
            };

            if start == end {
                return Err(NetworkError::invalid(format!(
                    "activity {name} would start and end at event {start}"
                )));
            }

            let edge = self.graph.add_edge(
                ActivityNetwork::node(start),
                ActivityNetwork::node(end),
                NetworkEdge::activity(name, te),
            );
            self.index.insert(
                name,
                ActivityEdge {
                    start,
                    end,
                    edge: edge.index(),
                },
            );
            debug!(activity = %name, start, end, te, "added activity edge");
        }

        let finish = match self.rule {
            FinishRule::SinkDetection => Some(self.join_sinks()),
            FinishRule::Positional => final_event.or_else(|| {
                activities
                    .last()
                    .and_then(|name| self.index.endpoints(name))
                    .map(|(_, end)| end)
            }),
        };

        if is_cyclic_directed(&self.graph) {
            return Err(NetworkError::CycleDetected);
        }

        debug!(
            events = self.graph.node_count(),
            edges = self.graph.edge_count(),
            ?finish,
            "activity network built"
        );

        Ok(ActivityNetwork {
            graph: self.graph,
            index: self.index,
            finish,
            rule: self.rule,
        })
    }

    fn allocate_event(&mut self) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        self.graph.add_node(id);
        id
    }

    /// The first predecessor's end event becomes the shared start; every other
    /// predecessor chain is tied into it with a zero-weight merge edge.
    fn shared_start(&mut self, name: &str, preds: &[String]) -> Result<EventId, NetworkError> {
        let mut shared: Option<EventId> = None;
        for pred in preds {
            let (_, pred_end) = self.index.endpoints(pred).ok_or_else(|| {
                NetworkError::invalid(format!(
                    "activity {name} references undefined predecessor {pred}"
                ))
            })?;
            match shared {
                None => shared = Some(pred_end),
                Some(target) => self.add_merge_edge(pred_end, target),
            }
        }
        shared.ok_or_else(|| NetworkError::invalid(format!("activity {name} has no predecessors")))
    }

    fn add_merge_edge(&mut self, from: EventId, to: EventId) {
        let (u, v) = (ActivityNetwork::node(from), ActivityNetwork::node(to));
        if from == to || self.graph.find_edge(u, v).is_some() {
            return;
        }
        self.graph.add_edge(u, v, NetworkEdge::merge());
        debug!(from, to, "added merge edge");
    }

    /// Collapses every dangling end event into a single finish event.
    fn join_sinks(&mut self) -> EventId {
        let mut sinks: Vec<EventId> = self
            .graph
            .externals(petgraph::Direction::Outgoing)
            .map(|ix| self.graph[ix])
            .collect();
        sinks.sort_unstable();
        if let [only] = sinks.as_slice() {
            return *only;
        }
        let finish = self.allocate_event();
        for sink in sinks {
            self.add_merge_edge(sink, finish);
        }
        finish
    }
}

/// Builds a network with the default [`FinishRule`].
pub fn build_network(
    activities: &[String],
    predecessors: &[Vec<String>],
    expected_times: &HashMap<String, f64>,
) -> Result<ActivityNetwork, NetworkError> {
    NetworkBuilder::new(FinishRule::default()).build(activities, predecessors, expected_times)
}
