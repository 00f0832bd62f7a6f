use crate::core::blossom::Matching;
use crate::core::error::SolverError;
use crate::core::graph::CompatibilityGraph;
use crate::models::{MatchingResult, Pair};

/// Translate a solver matching back into participant identities
///
/// Pairs are emitted in order of their lower vertex index; `first` is the
/// participant who signed up earlier. Unmatched participants keep signup
/// order.
pub fn map_result(
    graph: &CompatibilityGraph,
    matching: &Matching,
) -> Result<MatchingResult, SolverError> {
    if matching.vertex_count() != graph.vertex_count() {
        return Err(SolverError::InvalidMatching(format!(
            "matching covers {} vertices, graph has {}",
            matching.vertex_count(),
            graph.vertex_count()
        )));
    }

    let mut pairs = Vec::with_capacity(matching.len());
    for (low, high) in matching.edges() {
        let edge = graph.edge_between(low, high).ok_or_else(|| {
            SolverError::InvalidMatching(format!(
                "pair {} - {} is not a compatible edge",
                graph.participant(low),
                graph.participant(high)
            ))
        })?;
        let (first, second) = (&graph.signups()[low], &graph.signups()[high]);
        pairs.push(Pair {
            first: first.participant_id.clone(),
            second: second.participant_id.clone(),
            common_timeslots: edge.common_timeslots.clone(),
            english: first.english && second.english,
        });
    }

    let unmatched = matching
        .unmatched()
        .map(|v| graph.participant(v).clone())
        .collect();

    Ok(MatchingResult { pairs, unmatched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blossom;
    use crate::models::{CycleId, Signup, TimeslotId};

    #[test]
    fn test_every_participant_in_one_bucket() {
        let cycle = CycleId::new(2025, 1).unwrap();
        let mut a = Signup::new("A", cycle, [1, 2]);
        let mut b = Signup::new("B", cycle, [2]);
        a.english = true;
        b.english = true;
        let graph =
            CompatibilityGraph::build(vec![a, b, Signup::new("C", cycle, [9])]).unwrap();
        let matching = blossom::solve(graph.vertex_count(), &graph.edge_indices()).unwrap();

        let result = map_result(&graph, &matching).unwrap();

        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].first.as_str(), "A");
        assert_eq!(result.pairs[0].second.as_str(), "B");
        assert_eq!(result.pairs[0].common_timeslots, vec![TimeslotId(2)]);
        assert!(result.pairs[0].english);
        assert_eq!(result.unmatched, vec!["C".into()]);
        assert_eq!(result.participant_count(), 3);
    }

    #[test]
    fn test_rejects_matching_of_wrong_size() {
        let cycle = CycleId::new(2025, 1).unwrap();
        let graph = CompatibilityGraph::build(vec![Signup::new("A", cycle, [1])]).unwrap();
        let matching = blossom::solve(3, &[]).unwrap();
        assert!(map_result(&graph, &matching).is_err());
    }
}
