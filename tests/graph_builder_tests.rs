use pert_network::{FinishRule, NetworkBuilder, NetworkError, build_network};
use std::collections::HashMap;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn preds(list: &[&[&str]]) -> Vec<Vec<String>> {
    list.iter().map(|p| names(p)).collect()
}

fn times(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(n, t)| (n.to_string(), *t)).collect()
}

#[test]
fn linear_chain_gets_one_event_per_activity() {
    let network = build_network(
        &names(&["A", "B", "C"]),
        &preds(&[&[], &["A"], &["B"]]),
        &times(&[("A", 2.0), ("B", 3.0), ("C", 1.0)]),
    )
    .unwrap();

    assert_eq!(network.node_count(), 4);
    assert_eq!(network.edge_count(), 3);
    assert_eq!(network.index().endpoints("A"), Some((0, 1)));
    assert_eq!(network.index().endpoints("B"), Some((1, 2)));
    assert_eq!(network.index().endpoints("C"), Some((2, 3)));
    assert_eq!(network.finish_event(), Some(3));
}

#[test]
fn diamond_joins_second_predecessor_with_merge_edge() {
    let network = build_network(
        &names(&["A", "B", "C"]),
        &preds(&[&[], &[], &["A", "B"]]),
        &times(&[("A", 2.0), ("B", 4.0), ("C", 1.0)]),
    )
    .unwrap();

    // C starts at A's end event; B's end event feeds it through a merge edge.
    assert_eq!(network.index().endpoints("A"), Some((0, 1)));
    assert_eq!(network.index().endpoints("B"), Some((0, 2)));
    assert_eq!(network.index().endpoints("C"), Some((1, 3)));

    let merges: Vec<(u32, u32)> = network
        .edges()
        .filter(|(_, _, _, edge)| edge.is_merge())
        .map(|(from, to, _, _)| (from, to))
        .collect();
    assert_eq!(merges, vec![(2, 1)]);

    let merge = network
        .edges()
        .find(|(_, _, _, edge)| edge.is_merge())
        .map(|(_, _, _, edge)| edge.clone())
        .unwrap();
    assert_eq!(merge.weight, 0.0);
    assert!(merge.label.is_empty());
}

#[test]
fn edge_labels_carry_expected_time() {
    let network = build_network(&names(&["A"]), &preds(&[&[]]), &times(&[("A", 2.5)])).unwrap();
    let placement = network.index().placement("A").unwrap();
    let edge = network.edge(placement.edge).unwrap();
    assert_eq!(edge.label, "A (2.50)");
    assert_eq!(edge.weight, 2.5);
    assert_eq!(network.index().activity_for_edge(placement.edge), Some("A"));
}

#[test]
fn dangling_activities_converge_on_synthetic_finish() {
    let network = build_network(
        &names(&["A", "B", "C"]),
        &preds(&[&[], &["A"], &["A"]]),
        &times(&[("A", 2.0), ("B", 3.0), ("C", 1.0)]),
    )
    .unwrap();

    assert_eq!(network.node_count(), 5);
    assert_eq!(network.finish_event(), Some(4));
    assert_eq!(network.sinks(), vec![4]);
}

#[test]
fn positional_rule_collapses_last_two_activities() {
    let network = NetworkBuilder::new(FinishRule::Positional)
        .build(
            &names(&["A", "B", "C", "D", "E"]),
            &preds(&[&[], &["A"], &["A"], &["B"], &["C"]]),
            &times(&[("A", 2.0), ("B", 3.0), ("C", 1.0), ("D", 2.0), ("E", 3.0)]),
        )
        .unwrap();

    let (_, d_end) = network.index().endpoints("D").unwrap();
    let (_, e_end) = network.index().endpoints("E").unwrap();
    assert_eq!(d_end, e_end);
    assert_eq!(network.finish_event(), Some(d_end));
    assert_eq!(network.node_count(), 5);
}

#[test]
fn positional_rule_rejects_linear_chain() {
    let err = NetworkBuilder::new(FinishRule::Positional)
        .build(
            &names(&["A", "B", "C"]),
            &preds(&[&[], &["A"], &["B"]]),
            &times(&[("A", 2.0), ("B", 3.0), ("C", 1.0)]),
        )
        .unwrap_err();
    assert!(matches!(err, NetworkError::InvalidNetwork(_)));
}

#[test]
fn positional_rule_rejects_unconnected_final_activity() {
    let err = NetworkBuilder::new(FinishRule::Positional)
        .build(
            &names(&["A", "B", "C"]),
            &preds(&[&[], &["A"], &[]]),
            &times(&[("A", 2.0), ("B", 3.0), ("C", 1.0)]),
        )
        .unwrap_err();
    assert!(err.to_string().contains("invalid activity network"));
}

#[test]
fn undefined_predecessor_is_invalid() {
    let err = build_network(
        &names(&["A", "B"]),
        &preds(&[&["B"], &[]]),
        &times(&[("A", 1.0), ("B", 1.0)]),
    )
    .unwrap_err();
    assert_eq!(
        err,
        NetworkError::InvalidNetwork("activity A references undefined predecessor B".into())
    );
}

#[test]
fn empty_and_duplicate_inputs_are_rejected() {
    let err = build_network(&[], &[], &HashMap::new()).unwrap_err();
    assert_eq!(err, NetworkError::EmptyNetwork);

    let err = build_network(
        &names(&["A", "A"]),
        &preds(&[&[], &[]]),
        &times(&[("A", 1.0)]),
    )
    .unwrap_err();
    assert!(matches!(err, NetworkError::InvalidNetwork(_)));
}

#[test]
fn separate_builds_number_events_independently() {
    let build = || {
        build_network(
            &names(&["A", "B"]),
            &preds(&[&[], &["A"]]),
            &times(&[("A", 1.0), ("B", 1.0)]),
        )
        .unwrap()
    };
    let first = build();
    let second = build();
    assert_eq!(
        first.index().endpoints("B"),
        second.index().endpoints("B")
    );
}

#[test]
fn conflicting_merges_are_reported_as_cycle() {
    // C merges B into A's end event; D then merges C's end back into B's.
    let err = build_network(
        &names(&["A", "B", "C", "D"]),
        &preds(&[&[], &[], &["A", "B"], &["B", "C"]]),
        &times(&[("A", 1.0), ("B", 1.0), ("C", 1.0), ("D", 1.0)]),
    )
    .unwrap_err();
    assert_eq!(err, NetworkError::CycleDetected);
}

#[test]
fn finish_rules_parse_from_text() {
    assert_eq!("sink".parse::<FinishRule>(), Ok(FinishRule::SinkDetection));
    assert_eq!(
        " Sink_Detection ".parse::<FinishRule>(),
        Ok(FinishRule::SinkDetection)
    );
    assert_eq!("POSITIONAL".parse::<FinishRule>(), Ok(FinishRule::Positional));
    assert!(matches!(
        "diagonal".parse::<FinishRule>(),
        Err(NetworkError::InvalidNetwork(_))
    ));
}
