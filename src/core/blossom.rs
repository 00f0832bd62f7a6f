//! Maximum cardinality matching on general graphs (Edmonds' blossom algorithm)
//!
//! Vertices are `0..vertex_count`. The search is deterministic: adjacency
//! lists are sorted by neighbour index, a greedy pass seeds the matching in
//! index order, and augmenting paths are grown from free vertices in index
//! order. The result depends only on the vertex count and the edge set.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use crate::core::error::SolverError;

/// A matching over vertices `0..n`, stored as a symmetric mate table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    mate: Vec<Option<usize>>,
}

impl Matching {
    pub fn mate(&self, v: usize) -> Option<usize> {
        self.mate.get(v).copied().flatten()
    }

    pub fn vertex_count(&self) -> usize {
        self.mate.len()
    }

    /// Matched edges as `(low, high)`, ordered by the low endpoint
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.mate
            .iter()
            .enumerate()
            .filter_map(|(v, m)| match m {
                Some(u) if v < *u => Some((v, *u)),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.mate.iter().filter(|m| m.is_some()).count() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unmatched(&self) -> impl Iterator<Item = usize> + '_ {
        self.mate
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_none())
            .map(|(v, _)| v)
    }
}

/// Compute a maximum cardinality matching over `0..vertex_count`
///
/// Self loops, duplicate edges (in either orientation) and edges touching an
/// unknown vertex are rejected rather than repaired.
pub fn solve(vertex_count: usize, edges: &[(usize, usize)]) -> Result<Matching, SolverError> {
    let adjacency = build_adjacency(vertex_count, edges)?;

    let mut search = BlossomSearch::new(adjacency);
    search.seed_greedy();
    for root in 0..vertex_count {
        if search.mate[root].is_none() {
            if let Some(end) = search.find_augmenting_path(root) {
                search.augment(end);
            }
        }
    }

    let matching = Matching { mate: search.mate };
    verify(&matching, edges)?;
    Ok(matching)
}

/// Compute a maximum cardinality matching over arbitrary vertex labels
///
/// `vertices` fixes the processing order. Returned pairs are ordered by the
/// position of their first element in `vertices`.
pub fn maximum_matching<V>(vertices: &[V], edges: &[(V, V)]) -> Result<Vec<(V, V)>, SolverError>
where
    V: Clone + Eq + Hash + Debug,
{
    let mut index = HashMap::with_capacity(vertices.len());
    for (i, v) in vertices.iter().enumerate() {
        if index.insert(v.clone(), i).is_some() {
            return Err(SolverError::DuplicateVertex(format!("{:?}", v)));
        }
    }

    let lookup = |v: &V| {
        index.get(v).copied().ok_or_else(|| SolverError::UnknownVertex {
            vertex: format!("{:?}", v),
            vertex_count: vertices.len(),
        })
    };
    let indexed = edges
        .iter()
        .map(|(a, b)| Ok((lookup(a)?, lookup(b)?)))
        .collect::<Result<Vec<_>, SolverError>>()?;

    let matching = solve(vertices.len(), &indexed)?;
    Ok(matching
        .edges()
        .into_iter()
        .map(|(a, b)| (vertices[a].clone(), vertices[b].clone()))
        .collect())
}

fn build_adjacency(
    vertex_count: usize,
    edges: &[(usize, usize)],
) -> Result<Vec<Vec<usize>>, SolverError> {
    let mut adjacency = vec![Vec::new(); vertex_count];
    let mut seen = HashSet::with_capacity(edges.len());

    for &(a, b) in edges {
        for v in [a, b] {
            if v >= vertex_count {
                return Err(SolverError::UnknownVertex {
                    vertex: v.to_string(),
                    vertex_count,
                });
            }
        }
        if a == b {
            return Err(SolverError::SelfLoop(a.to_string()));
        }
        if !seen.insert((a.min(b), a.max(b))) {
            return Err(SolverError::DuplicateEdge(a.to_string(), b.to_string()));
        }
        adjacency[a].push(b);
        adjacency[b].push(a);
    }

    for neighbours in &mut adjacency {
        neighbours.sort_unstable();
    }
    Ok(adjacency)
}

/// Independent check that `matching` is a valid matching of `edges`
fn verify(matching: &Matching, edges: &[(usize, usize)]) -> Result<(), SolverError> {
    let edge_set: HashSet<(usize, usize)> =
        edges.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();

    for (v, mate) in matching.mate.iter().enumerate() {
        let Some(u) = *mate else { continue };
        if matching.mate(u) != Some(v) {
            return Err(SolverError::InvalidMatching(format!(
                "vertex {} is matched to {} but {} is not matched back",
                v, u, u
            )));
        }
        if !edge_set.contains(&(v.min(u), v.max(u))) {
            return Err(SolverError::InvalidMatching(format!(
                "pair {} - {} is not an edge of the graph",
                v, u
            )));
        }
    }
    Ok(())
}

/// Working state of the augmenting path search
struct BlossomSearch {
    adjacency: Vec<Vec<usize>>,
    mate: Vec<Option<usize>>,
    /// Alternating tree parent of inner (odd) vertices
    parent: Vec<Option<usize>>,
    /// Base vertex of the blossom each vertex currently belongs to
    base: Vec<usize>,
    /// Outer (even) vertices already queued in this search
    outer: Vec<bool>,
    in_blossom: Vec<bool>,
    queue: VecDeque<usize>,
}

impl BlossomSearch {
    fn new(adjacency: Vec<Vec<usize>>) -> Self {
        let n = adjacency.len();
        Self {
            adjacency,
            mate: vec![None; n],
            parent: vec![None; n],
            base: (0..n).collect(),
            outer: vec![false; n],
            in_blossom: vec![false; n],
            queue: VecDeque::with_capacity(n),
        }
    }

    fn seed_greedy(&mut self) {
        for v in 0..self.adjacency.len() {
            if self.mate[v].is_some() {
                continue;
            }
            let free = self.adjacency[v]
                .iter()
                .copied()
                .find(|&u| self.mate[u].is_none());
            if let Some(u) = free {
                self.mate[v] = Some(u);
                self.mate[u] = Some(v);
            }
        }
    }

    /// Grow an alternating tree from `root`; returns the free vertex ending an
    /// augmenting path, with the path recorded in `parent`/`mate`
    fn find_augmenting_path(&mut self, root: usize) -> Option<usize> {
        let n = self.adjacency.len();
        self.parent.iter_mut().for_each(|p| *p = None);
        self.outer.iter_mut().for_each(|o| *o = false);
        for (v, b) in self.base.iter_mut().enumerate() {
            *b = v;
        }
        self.queue.clear();

        self.outer[root] = true;
        self.queue.push_back(root);

        while let Some(v) = self.queue.pop_front() {
            for i in 0..self.adjacency[v].len() {
                let to = self.adjacency[v][i];
                if self.base[v] == self.base[to] || self.mate[v] == Some(to) {
                    continue;
                }

                let to_is_outer = to == root
                    || self.mate[to].is_some_and(|m| self.parent[m].is_some());
                if to_is_outer {
                    // odd cycle: contract the blossom onto its base
                    let blossom_base = self.lowest_common_ancestor(v, to);
                    self.in_blossom.iter_mut().for_each(|b| *b = false);
                    self.mark_path(v, blossom_base, to);
                    self.mark_path(to, blossom_base, v);
                    for u in 0..n {
                        if self.in_blossom[self.base[u]] {
                            self.base[u] = blossom_base;
                            if !self.outer[u] {
                                self.outer[u] = true;
                                self.queue.push_back(u);
                            }
                        }
                    }
                } else if self.parent[to].is_none() {
                    self.parent[to] = Some(v);
                    match self.mate[to] {
                        None => return Some(to),
                        Some(m) => {
                            self.outer[m] = true;
                            self.queue.push_back(m);
                        }
                    }
                }
            }
        }
        None
    }

    fn lowest_common_ancestor(&self, mut a: usize, mut b: usize) -> usize {
        let mut on_path = vec![false; self.adjacency.len()];
        loop {
            a = self.base[a];
            on_path[a] = true;
            match self.mate[a].and_then(|m| self.parent[m]) {
                Some(next) => a = next,
                None => break,
            }
        }
        loop {
            b = self.base[b];
            if on_path[b] {
                return b;
            }
            match self.mate[b].and_then(|m| self.parent[m]) {
                Some(next) => b = next,
                None => return b,
            }
        }
    }

    fn mark_path(&mut self, mut v: usize, blossom_base: usize, mut child: usize) {
        while self.base[v] != blossom_base {
            let Some(m) = self.mate[v] else { break };
            self.in_blossom[self.base[v]] = true;
            self.in_blossom[self.base[m]] = true;
            self.parent[v] = Some(child);
            child = m;
            match self.parent[m] {
                Some(next) => v = next,
                None => break,
            }
        }
    }

    fn augment(&mut self, end: usize) {
        let mut v = end;
        while let Some(pv) = self.parent[v] {
            let next = self.mate[pv];
            self.mate[v] = Some(pv);
            self.mate[pv] = Some(v);
            match next {
                Some(n) => v = n,
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        let matching = solve(0, &[]).unwrap();
        assert!(matching.is_empty());
        assert_eq!(matching.vertex_count(), 0);
    }

    #[test]
    fn test_path_of_four_is_perfect() {
        let matching = solve(4, &[(1, 2), (0, 1), (2, 3)]).unwrap();
        assert_eq!(matching.len(), 2);
        assert_eq!(matching.edges(), vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_triangle_with_tail_needs_blossom() {
        // triangle 0-1-2 with pendant 3 on 2 and pendant 4 on 0
        let edges = [(0, 1), (1, 2), (2, 0), (2, 3), (0, 4)];
        let matching = solve(5, &edges).unwrap();
        assert_eq!(matching.len(), 2);
    }

    #[test]
    fn test_odd_cycle_of_five_plus_stem() {
        // 5-cycle 1..=5 with stem 0-1; maximum is 3
        let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 1)];
        let matching = solve(6, &edges).unwrap();
        assert_eq!(matching.len(), 3);
        assert_eq!(matching.unmatched().count(), 0);
    }

    #[test]
    fn test_augmenting_path_through_blossom() {
        // greedy seeds 0-1 and 2-3, leaving 4 and 5 free; the augmenting path
        // 4-0=1-3=2-5 is found after contracting the triangle 1-2-3
        let edges = [(0, 1), (1, 2), (2, 3), (3, 1), (4, 0), (2, 5)];
        let matching = solve(6, &edges).unwrap();
        assert_eq!(matching.len(), 3);
        assert_eq!(matching.edges(), vec![(0, 4), (1, 3), (2, 5)]);
    }

    #[test]
    fn test_rejects_self_loop() {
        assert_eq!(solve(2, &[(1, 1)]), Err(SolverError::SelfLoop("1".into())));
    }

    #[test]
    fn test_rejects_unknown_vertex() {
        let err = solve(2, &[(0, 2)]).unwrap_err();
        assert!(matches!(err, SolverError::UnknownVertex { vertex_count: 2, .. }));
    }

    #[test]
    fn test_rejects_duplicate_edge_in_either_orientation() {
        let err = solve(2, &[(0, 1), (1, 0)]).unwrap_err();
        assert!(matches!(err, SolverError::DuplicateEdge(_, _)));
    }

    #[test]
    fn test_labelled_matching_rejects_duplicate_vertex() {
        let err = maximum_matching(&["a", "a"], &[]).unwrap_err();
        assert!(matches!(err, SolverError::DuplicateVertex(_)));
    }

    #[test]
    fn test_labelled_matching_rejects_unknown_label() {
        let err = maximum_matching(&["a", "b"], &[("a", "c")]).unwrap_err();
        assert!(matches!(err, SolverError::UnknownVertex { .. }));
    }

    #[test]
    fn test_labelled_matching() {
        let pairs = maximum_matching(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c"), ("b", "d")])
            .unwrap();
        assert_eq!(pairs, vec![("a", "c"), ("b", "d")]);
    }

    #[test]
    fn test_deterministic_under_edge_reordering() {
        let edges = [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)];
        let mut reversed = edges;
        reversed.reverse();
        assert_eq!(solve(4, &edges).unwrap(), solve(4, &reversed).unwrap());
    }

    #[test]
    fn test_verify_rejects_one_sided_mate() {
        let matching = Matching {
            mate: vec![Some(1), None],
        };
        let err = verify(&matching, &[(0, 1)]).unwrap_err();
        assert!(matches!(err, SolverError::InvalidMatching(_)));
    }

    #[test]
    fn test_verify_rejects_pair_outside_edges() {
        let matching = Matching {
            mate: vec![Some(2), None, Some(0)],
        };
        let err = verify(&matching, &[(0, 1), (1, 2)]).unwrap_err();
        assert!(matches!(err, SolverError::InvalidMatching(_)));

        assert!(verify(&matching, &[(2, 0)]).is_ok());
    }
}
