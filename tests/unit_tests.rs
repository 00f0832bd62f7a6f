// Unit tests for the pairing core

use mock_pairs::core::{blossom, pair_signups, CompatibilityGraph};
use mock_pairs::models::{CycleId, ExclusionHistory, ParticipantId, Signup, UnorderedPair};

fn cycle() -> CycleId {
    CycleId::new(2025, 33).unwrap()
}

fn id(s: &str) -> ParticipantId {
    ParticipantId::new(s)
}

/// A:{1,2}, B:{2,3}, C:{1}, D:{3}
fn four_participants() -> Vec<Signup> {
    vec![
        Signup::new("A", cycle(), [1, 2]),
        Signup::new("B", cycle(), [2, 3]),
        Signup::new("C", cycle(), [1]),
        Signup::new("D", cycle(), [3]),
    ]
}

#[test]
fn test_scenario_a_everyone_paired() {
    let result = pair_signups(cycle(), four_participants(), &ExclusionHistory::new()).unwrap();

    assert_eq!(result.pairs.len(), 2);
    assert!(result.unmatched.is_empty());
    let keys: Vec<_> = result.pairs.iter().map(|p| p.key()).collect();
    assert!(keys.contains(&UnorderedPair::new(id("A"), id("C"))));
    assert!(keys.contains(&UnorderedPair::new(id("B"), id("D"))));
}

#[test]
fn test_scenario_b_history_blocks_a_c() {
    let history: ExclusionHistory = [UnorderedPair::new(id("A"), id("C"))].into_iter().collect();

    let result = pair_signups(cycle(), four_participants(), &history).unwrap();

    assert_eq!(result.pairs.len(), 1);
    assert_eq!(result.unmatched.len(), 2);
    let pair = &result.pairs[0];
    let key = pair.key();
    assert!(
        key == UnorderedPair::new(id("A"), id("B")) || key == UnorderedPair::new(id("B"), id("D"))
    );
    for unmatched in &result.unmatched {
        assert!(!pair.involves(unmatched));
    }
}

#[test]
fn test_scenario_c_no_signups() {
    let result = pair_signups(cycle(), vec![], &ExclusionHistory::new()).unwrap();
    assert!(result.pairs.is_empty());
    assert!(result.unmatched.is_empty());
}

#[test]
fn test_scenario_d_single_signup() {
    let result = pair_signups(
        cycle(),
        vec![Signup::new("solo", cycle(), [1, 2, 3])],
        &ExclusionHistory::new(),
    )
    .unwrap();
    assert!(result.pairs.is_empty());
    assert_eq!(result.unmatched, vec![id("solo")]);
}

#[test]
fn test_eligible_edges_for_scenario_graph() {
    let graph = CompatibilityGraph::build(four_participants()).unwrap();
    let edges: Vec<_> = graph
        .edge_indices()
        .into_iter()
        .map(|(a, b)| (graph.participant(a).as_str(), graph.participant(b).as_str()))
        .collect();
    assert_eq!(edges, vec![("A", "B"), ("A", "C"), ("B", "D")]);
}

#[test]
fn test_pairs_share_a_timeslot() {
    let result = pair_signups(cycle(), four_participants(), &ExclusionHistory::new()).unwrap();
    for pair in &result.pairs {
        assert!(!pair.common_timeslots.is_empty());
    }
}

#[test]
fn test_odd_cycle_of_participants() {
    // five people all free at slot 1 form a complete graph: two pairs, one left over
    let signups: Vec<_> = ["p1", "p2", "p3", "p4", "p5"]
        .iter()
        .map(|name| Signup::new(*name, cycle(), [1]))
        .collect();
    let result = pair_signups(cycle(), signups, &ExclusionHistory::new()).unwrap();
    assert_eq!(result.pairs.len(), 2);
    assert_eq!(result.unmatched, vec![id("p5")]);
}

#[test]
fn test_solver_is_deterministic() {
    let graph = CompatibilityGraph::build(four_participants()).unwrap();
    let first = blossom::solve(graph.vertex_count(), &graph.edge_indices()).unwrap();
    for _ in 0..10 {
        let again = blossom::solve(graph.vertex_count(), &graph.edge_indices()).unwrap();
        assert_eq!(first, again);
    }
}
