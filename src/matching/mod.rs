//! Matchings in undirected graphs.
//!
//! The entry points at the bottom of this module dispatch to one of four
//! engines, decided once per call from two properties of the input: whether
//! the weight function is the cardinality sentinel, and whether the graph is
//! bipartite.
//!
//! | weights     | bipartite | engine                       |
//! |-------------|-----------|------------------------------|
//! | Cardinality | yes       | Hopcroft-Karp                |
//! | Cardinality | no        | multi-source blossom search  |
//! | Function    | yes       | successive shortest paths    |
//! | Function    | no        | primal-dual blossom engine   |

mod assignment;
mod blossom;
mod cardinality;
mod hopcroft_karp;
pub mod lca;
mod result;
pub mod union_find;

use std::fmt::Debug;
use std::hash::Hash;

use log::debug;
use num_traits::Float;

use crate::error::{GraphError, Result};
use crate::graph::Graph;

pub use result::Matching;

/// Edge weights for a matching computation.
///
/// `Cardinality` means every edge weighs one; it routes the call to the
/// cheaper cardinality engines that never touch dual variables. `Function`
/// maps an edge index to a real weight.
pub enum EdgeWeights<'a, W> {
    Cardinality,
    Function(&'a dyn Fn(usize) -> W),
}

/// Computes a maximum weight matching.
///
/// With [`EdgeWeights::Cardinality`] this is a maximum cardinality matching.
/// With a weight function, edges of negative or zero value are left out when
/// that increases the total.
///
/// # Errors
/// * `InvalidInput` if the graph is directed.
/// * `NonFiniteWeight` if the weight function returns a NaN or infinity.
pub fn maximum_matching<'g, V, W>(
    graph: &'g Graph<V>,
    weights: EdgeWeights<W>,
) -> Result<Matching<'g, V, W>>
where
    V: Hash + Eq + Copy + Debug,
    W: Float + Debug,
{
    compute(graph, weights, false, false)
}

/// Computes a minimum weight matching.
///
/// The empty matching is a candidate, so with non-negative weights the
/// result is empty; only edges of negative weight can lower the total.
///
/// # Errors
/// Same conditions as [`maximum_matching`].
pub fn minimum_matching<'g, V, W>(
    graph: &'g Graph<V>,
    weights: EdgeWeights<W>,
) -> Result<Matching<'g, V, W>>
where
    V: Hash + Eq + Copy + Debug,
    W: Float + Debug,
{
    compute(graph, weights, true, false)
}

/// Computes a maximum weight perfect matching.
///
/// # Errors
/// * `NoPerfectMatching` if the graph has no perfect matching.
/// * Same input conditions as [`maximum_matching`].
pub fn maximum_perfect_matching<'g, V, W>(
    graph: &'g Graph<V>,
    weights: EdgeWeights<W>,
) -> Result<Matching<'g, V, W>>
where
    V: Hash + Eq + Copy + Debug,
    W: Float + Debug,
{
    compute(graph, weights, false, true)
}

/// Computes a minimum weight perfect matching.
///
/// # Errors
/// * `NoPerfectMatching` if the graph has no perfect matching.
/// * Same input conditions as [`maximum_matching`].
pub fn minimum_perfect_matching<'g, V, W>(
    graph: &'g Graph<V>,
    weights: EdgeWeights<W>,
) -> Result<Matching<'g, V, W>>
where
    V: Hash + Eq + Copy + Debug,
    W: Float + Debug,
{
    compute(graph, weights, true, true)
}

fn compute<'g, V, W>(
    graph: &'g Graph<V>,
    weights: EdgeWeights<W>,
    minimize: bool,
    perfect: bool,
) -> Result<Matching<'g, V, W>>
where
    V: Hash + Eq + Copy + Debug,
    W: Float + Debug,
{
    if graph.is_directed() {
        return Err(GraphError::invalid_input(
            "matching requires an undirected graph",
        ));
    }
    let n = graph.vertex_count();
    if perfect && n % 2 == 1 {
        return Err(GraphError::NoPerfectMatching);
    }
    let colors = graph.bipartition();

    match weights {
        EdgeWeights::Cardinality => {
            if minimize && !perfect {
                // The empty matching is minimal when every edge weighs one.
                return Ok(Matching::new(graph, vec![None; n], W::zero()));
            }
            // Minimum and maximum coincide for perfect matchings under unit
            // weights, so the minimize flag is moot from here on.
            let matched = match &colors {
                Some(side) => {
                    debug!("dispatch: cardinality, bipartite");
                    hopcroft_karp::hopcroft_karp(n, graph.adjacency_lists(), side)
                }
                None => {
                    debug!("dispatch: cardinality, general");
                    cardinality::maximum_cardinality_matching(n, graph.adjacency_lists())
                }
            };
            if perfect && matched.iter().any(|m| m.is_none()) {
                return Err(GraphError::NoPerfectMatching);
            }
            let size = matched.iter().flatten().count() / 2;
            let weight = W::from(size).unwrap_or_else(W::zero);
            Ok(Matching::new(graph, matched, weight))
        }
        EdgeWeights::Function(f) => {
            let m = graph.edge_count();
            let mut edge_weights = Vec::with_capacity(m);
            for e in 0..m {
                let w = f(e);
                if !w.is_finite() {
                    return Err(GraphError::NonFiniteWeight);
                }
                edge_weights.push(w);
            }
            match colors {
                Some(side) => {
                    debug!("dispatch: weighted, bipartite");
                    weighted_bipartite(graph, &edge_weights, &side, minimize, perfect)
                }
                None => {
                    debug!("dispatch: weighted, general");
                    weighted_general(graph, &edge_weights, minimize, perfect)
                }
            }
        }
    }
}

fn weighted_general<'g, V, W>(
    graph: &'g Graph<V>,
    edge_weights: &[W],
    minimize: bool,
    perfect: bool,
) -> Result<Matching<'g, V, W>>
where
    V: Hash + Eq + Copy + Debug,
    W: Float + Debug,
{
    let n = graph.vertex_count();
    let edges: Vec<(usize, usize)> = (0..graph.edge_count())
        .map(|e| graph.endpoint_indices(e).unwrap_or((0, 0)))
        .collect();
    let engine_weights: Vec<W> = if minimize {
        edge_weights.iter().map(|&w| -w).collect()
    } else {
        edge_weights.to_vec()
    };
    // Perfect matchings are found by maximizing cardinality first; weight
    // only breaks ties, which is exactly the maximum (or minimum) weight
    // perfect matching when one exists.
    let mut engine = blossom::WeightedBlossom::new(n, edges, engine_weights, perfect);
    engine.solve();

    let matched: Vec<Option<usize>> = (0..n).map(|v| engine.mate_edge(v)).collect();
    if perfect && matched.iter().any(|e| e.is_none()) {
        return Err(GraphError::NoPerfectMatching);
    }
    let weight = matching_weight(&matched, edge_weights);
    Ok(Matching::new(graph, matched, weight))
}

fn weighted_bipartite<'g, V, W>(
    graph: &'g Graph<V>,
    edge_weights: &[W],
    side: &[bool],
    minimize: bool,
    perfect: bool,
) -> Result<Matching<'g, V, W>>
where
    V: Hash + Eq + Copy + Debug,
    W: Float + Debug,
{
    let n = graph.vertex_count();
    // Compact per-side index spaces.
    let mut left_pos = vec![usize::MAX; n];
    let mut right_pos = vec![usize::MAX; n];
    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    for v in 0..n {
        if side[v] {
            right_pos[v] = rights.len();
            rights.push(v);
        } else {
            left_pos[v] = lefts.len();
            lefts.push(v);
        }
    }
    if perfect && lefts.len() != rights.len() {
        return Err(GraphError::NoPerfectMatching);
    }

    // The engine minimizes cost, so maximization negates. Triples stay in
    // edge order, so a pick's position is the edge index.
    let triples: Vec<(usize, usize, W)> = (0..graph.edge_count())
        .map(|e| {
            let (u, v) = graph.endpoint_indices(e).unwrap_or((0, 0));
            let (l, r) = if side[u] { (v, u) } else { (u, v) };
            let cost = if minimize {
                edge_weights[e]
            } else {
                -edge_weights[e]
            };
            (left_pos[l], right_pos[r], cost)
        })
        .collect();
    let picks = assignment::min_cost_bipartite(lefts.len(), rights.len(), &triples, perfect)?;

    let mut matched = vec![None; n];
    for (lp, pick) in picks.iter().enumerate() {
        if let Some(e) = *pick {
            let (u, v) = graph.endpoint_indices(e).unwrap_or((0, 0));
            matched[u] = Some(e);
            matched[v] = Some(e);
            debug_assert!(left_pos[u.min(v)] == lp || left_pos[u.max(v)] == lp);
        }
    }
    if perfect && matched.iter().any(|e| e.is_none()) {
        return Err(GraphError::NoPerfectMatching);
    }
    let weight = matching_weight(&matched, edge_weights);
    Ok(Matching::new(graph, matched, weight))
}

fn matching_weight<W: Float>(matched: &[Option<usize>], edge_weights: &[W]) -> W {
    let mut seen = vec![false; edge_weights.len()];
    let mut total = W::zero();
    for e in matched.iter().flatten() {
        if !seen[*e] {
            seen[*e] = true;
            total = total + edge_weights[*e];
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn unit() -> EdgeWeights<'static, f64> {
        EdgeWeights::Cardinality
    }

    #[test]
    fn test_four_cycle_cardinality() {
        let mut g = Graph::new_undirected();
        for i in 0..4 {
            g.add_edge(i, (i + 1) % 4).unwrap();
        }
        let m = maximum_matching(&g, unit()).unwrap();
        assert_eq!(m.size(), 2);
        assert!(m.is_perfect());
        // Opposite edges only.
        let es = m.edges();
        assert!(es == [0, 2] || es == [1, 3]);
    }

    #[test]
    fn test_single_edge() {
        let mut g = Graph::new_undirected();
        g.add_edge('a', 'b').unwrap();
        let m = maximum_matching(&g, unit()).unwrap();
        assert_eq!(m.size(), 1);
        assert!(m.is_perfect());
        assert_eq!(m.partner(&'a').unwrap(), Some(&'b'));
    }

    #[test]
    fn test_isolated_vertex() {
        let mut g: Graph<u32> = Graph::new_undirected();
        g.add_vertex(0);
        let m = maximum_matching(&g, unit()).unwrap();
        assert!(m.edges().is_empty());
        assert!(!m.is_vertex_matched(&0).unwrap());
        assert!(!m.is_perfect());
    }

    #[test]
    fn test_directed_graph_rejected() {
        let mut g = Graph::new();
        g.add_edge(0, 1).unwrap();
        assert!(matches!(
            maximum_matching(&g, unit()),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        let f = |_: usize| f64::NAN;
        assert!(matches!(
            maximum_matching(&g, EdgeWeights::Function(&f)),
            Err(GraphError::NonFiniteWeight)
        ));
    }

    #[test]
    fn test_even_cycle_perfect_round_trip() {
        for k in 1..6 {
            let mut g = Graph::new_undirected();
            let n = 2 * k;
            if k == 1 {
                // The two-vertex cycle collapses to a single edge.
                g.add_edge(0, 1).unwrap();
            } else {
                for i in 0..n {
                    g.add_edge(i, (i + 1) % n).unwrap();
                }
            }
            let m = maximum_perfect_matching(&g, unit()).unwrap();
            assert_eq!(m.size(), k);
            assert!(m.is_perfect());
        }
    }

    #[test]
    fn test_odd_graph_has_no_perfect_matching() {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        assert!(matches!(
            maximum_perfect_matching(&g, unit()),
            Err(GraphError::NoPerfectMatching)
        ));
    }

    #[test]
    fn test_even_graph_without_perfect_matching() {
        // A star on four vertices: only one edge can ever be matched.
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(0, 2).unwrap();
        g.add_edge(0, 3).unwrap();
        assert!(matches!(
            maximum_perfect_matching(&g, unit()),
            Err(GraphError::NoPerfectMatching)
        ));
    }

    #[test]
    fn test_weighted_general_triangle_with_tail() {
        // Non-bipartite: the triangle forces the general engine, and the
        // optimum pairs the tail with the triangle vertex it hangs off.
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 0).unwrap();
        g.add_edge(2, 3).unwrap();
        let w = [8.0, 10.0, 9.0, 7.0];
        let f = |e: usize| w[e];
        let m = maximum_matching(&g, EdgeWeights::Function(&f)).unwrap();
        assert_relative_eq!(m.weight(), 15.0, epsilon = 1e-10);
        assert!(m.is_perfect());
        assert_eq!(m.edges(), &[0, 3]);
    }

    #[test]
    fn test_weighted_prefers_single_heavy_edge() {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 3).unwrap();
        let w = [5.0, 11.0, 5.0];
        let f = |e: usize| w[e];
        let m = maximum_matching(&g, EdgeWeights::Function(&f)).unwrap();
        assert_relative_eq!(m.weight(), 11.0, epsilon = 1e-10);
        assert_eq!(m.size(), 1);
        // The perfect variant must take both outer edges instead.
        let p = maximum_perfect_matching(&g, EdgeWeights::Function(&f)).unwrap();
        assert_relative_eq!(p.weight(), 10.0, epsilon = 1e-10);
        assert!(p.is_perfect());
    }

    #[test]
    fn test_minimum_matching_is_empty_for_positive_weights() {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(2, 3).unwrap();
        let f = |_: usize| 4.0;
        let m = minimum_matching(&g, EdgeWeights::Function(&f)).unwrap();
        assert_eq!(m.size(), 0);
        assert_relative_eq!(m.weight(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_minimum_matching_takes_negative_edges() {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 3).unwrap();
        let w = [-3.0, 1.0, -2.0];
        let f = |e: usize| w[e];
        let m = minimum_matching(&g, EdgeWeights::Function(&f)).unwrap();
        assert_relative_eq!(m.weight(), -5.0, epsilon = 1e-10);
        assert_eq!(m.size(), 2);
    }

    #[test]
    fn test_minimum_perfect_matching_on_cycle() {
        // C_4 with one cheap diagonal pair of opposite edges.
        let mut g = Graph::new_undirected();
        for i in 0..4 {
            g.add_edge(i, (i + 1) % 4).unwrap();
        }
        let w = [1.0, 5.0, 2.0, 5.0];
        let f = |e: usize| w[e];
        let m = minimum_perfect_matching(&g, EdgeWeights::Function(&f)).unwrap();
        assert!(m.is_perfect());
        assert_relative_eq!(m.weight(), 3.0, epsilon = 1e-10);
        assert_eq!(m.edges(), &[0, 2]);
    }

    #[test]
    fn test_weighted_bipartite_dispatch() {
        // Even cycles are bipartite, so this exercises the assignment path.
        let mut g = Graph::new_undirected();
        for i in 0..6 {
            g.add_edge(i, (i + 1) % 6).unwrap();
        }
        let w = [4.0, 1.0, 4.0, 1.0, 4.0, 1.0];
        let f = |e: usize| w[e];
        let m = maximum_matching(&g, EdgeWeights::Function(&f)).unwrap();
        assert_relative_eq!(m.weight(), 12.0, epsilon = 1e-10);
        assert!(m.is_perfect());
    }

    #[test]
    fn test_perfect_matching_in_unbalanced_bipartite_graph() {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(0, 2).unwrap();
        let f = |_: usize| 1.0;
        assert!(matches!(
            maximum_perfect_matching(&g, EdgeWeights::Function(&f)),
            Err(GraphError::NoPerfectMatching)
        ));
    }

    /// The bipartite fast path and the general engine must agree on total
    /// weight for bipartite inputs.
    #[test]
    fn test_bipartite_path_matches_general_engine() {
        use rand::prelude::*;
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..40 {
            let l = rng.gen_range(1..5);
            let r = rng.gen_range(1..5);
            let mut g = Graph::new_undirected();
            let mut weights = Vec::new();
            for u in 0..l {
                for v in 0..r {
                    if rng.gen_bool(0.5) {
                        g.add_edge(u, l + v).unwrap();
                        weights.push(rng.gen_range(1..30) as f64);
                    }
                }
            }
            if g.vertex_count() == 0 {
                continue;
            }
            let n = g.vertex_count();
            let edges: Vec<(usize, usize)> = (0..g.edge_count())
                .map(|e| g.endpoint_indices(e).unwrap())
                .collect();

            let f = |e: usize| weights[e];
            let via_facade = maximum_matching(&g, EdgeWeights::Function(&f)).unwrap();

            let mut engine = blossom::WeightedBlossom::new(n, edges, weights.clone(), false);
            engine.solve();
            let general: Vec<Option<usize>> = (0..n).map(|v| engine.mate_edge(v)).collect();
            let general_weight = matching_weight(&general, &weights);

            assert_relative_eq!(via_facade.weight(), general_weight, epsilon = 1e-10);
        }
    }

    /// Same graph, cardinality sentinel: both engine families agree on size.
    #[test]
    fn test_cardinality_engines_agree_on_bipartite_graphs() {
        use rand::prelude::*;
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..40 {
            let l = rng.gen_range(1..6);
            let r = rng.gen_range(1..6);
            let n = l + r;
            let mut adj = vec![Vec::new(); n];
            let mut e = 0;
            for u in 0..l {
                for v in l..n {
                    if rng.gen_bool(0.4) {
                        adj[u].push((v, e));
                        adj[v].push((u, e));
                        e += 1;
                    }
                }
            }
            let side: Vec<bool> = (0..n).map(|v| v >= l).collect();
            let hk = hopcroft_karp::hopcroft_karp(n, &adj, &side);
            let general = cardinality::maximum_cardinality_matching(n, &adj);
            assert_eq!(
                hk.iter().flatten().count(),
                general.iter().flatten().count()
            );
        }
    }
}
