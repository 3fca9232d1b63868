use std::cell::OnceCell;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{GraphError, Result};
use crate::graph::Graph;

/// Read-only view of a computed matching.
///
/// Wraps the per-vertex matched-edge array produced by the engines and maps
/// index-space results back to the caller's vertex identifiers. Derived
/// collections are computed on first access and cached; no accessor mutates
/// the underlying array.
pub struct Matching<'g, V, W> {
    graph: &'g Graph<V>,
    /// Matched edge of each vertex index, or None.
    matched: Vec<Option<usize>>,
    /// Total weight of the matched edges.
    weight: W,
    matched_vertices: OnceCell<Vec<V>>,
    unmatched_vertices: OnceCell<Vec<V>>,
    edges: OnceCell<Vec<usize>>,
}

impl<'g, V, W> Matching<'g, V, W>
where
    V: Hash + Eq + Copy + Debug,
    W: Copy,
{
    pub(crate) fn new(graph: &'g Graph<V>, matched: Vec<Option<usize>>, weight: W) -> Self {
        debug_assert_eq!(matched.len(), graph.vertex_count());
        Matching {
            graph,
            matched,
            weight,
            matched_vertices: OnceCell::new(),
            unmatched_vertices: OnceCell::new(),
            edges: OnceCell::new(),
        }
    }

    fn index_of(&self, v: &V) -> Result<usize> {
        self.graph.index_of(v).ok_or(GraphError::VertexNotFound)
    }

    /// Whether vertex `v` is covered by the matching.
    ///
    /// # Errors
    /// * `VertexNotFound` if `v` is not in the graph.
    pub fn is_vertex_matched(&self, v: &V) -> Result<bool> {
        Ok(self.matched[self.index_of(v)?].is_some())
    }

    /// The matched edge incident to `v`, if any.
    ///
    /// # Errors
    /// * `VertexNotFound` if `v` is not in the graph.
    pub fn matched_edge(&self, v: &V) -> Result<Option<usize>> {
        Ok(self.matched[self.index_of(v)?])
    }

    /// The vertex `v` is matched with, if any.
    ///
    /// # Errors
    /// * `VertexNotFound` if `v` is not in the graph.
    pub fn partner(&self, v: &V) -> Result<Option<&V>> {
        let i = self.index_of(v)?;
        Ok(self.matched[i].map(|e| {
            let (a, b) = self
                .graph
                .endpoint_indices(e)
                .unwrap_or((i, i));
            self.graph.vertex_at(if a == i { b } else { a })
        }))
    }

    /// Identifiers of all matched vertices, in insertion order.
    pub fn matched_vertices(&self) -> &[V] {
        self.matched_vertices.get_or_init(|| {
            (0..self.matched.len())
                .filter(|&i| self.matched[i].is_some())
                .map(|i| *self.graph.vertex_at(i))
                .collect()
        })
    }

    /// Identifiers of all unmatched vertices, in insertion order.
    pub fn unmatched_vertices(&self) -> &[V] {
        self.unmatched_vertices.get_or_init(|| {
            (0..self.matched.len())
                .filter(|&i| self.matched[i].is_none())
                .map(|i| *self.graph.vertex_at(i))
                .collect()
        })
    }

    /// The matched edges, one per matched pair.
    ///
    /// Deduplicated by keeping the edge at its source endpoint only.
    pub fn edges(&self) -> &[usize] {
        self.edges.get_or_init(|| {
            (0..self.matched.len())
                .filter_map(|i| {
                    let e = self.matched[i]?;
                    let (source, _) = self.graph.endpoint_indices(e)?;
                    if source == i {
                        Some(e)
                    } else {
                        None
                    }
                })
                .collect()
        })
    }

    /// Whether edge `e` is part of the matching.
    pub fn contains_edge(&self, e: usize) -> bool {
        self.graph
            .endpoint_indices(e)
            .map_or(false, |(u, _)| self.matched[u] == Some(e))
    }

    /// Number of matched edges.
    pub fn size(&self) -> usize {
        self.edges().len()
    }

    /// Whether every vertex of the graph is matched.
    pub fn is_perfect(&self) -> bool {
        self.matched.iter().all(|m| m.is_some())
    }

    /// Total weight of the matching under the weight function it was
    /// computed with; equals the matching size for cardinality calls.
    pub fn weight(&self) -> W {
        self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> Graph<u32> {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 3).unwrap();
        g
    }

    #[test]
    fn test_accessors() {
        let g = path_graph();
        // Matching {(0,1), (2,3)}: edges 0 and 2.
        let matched = vec![Some(0), Some(0), Some(2), Some(2)];
        let m = Matching::new(&g, matched, 2.0f64);
        assert!(m.is_vertex_matched(&0).unwrap());
        assert_eq!(m.matched_edge(&1).unwrap(), Some(0));
        assert_eq!(m.partner(&2).unwrap(), Some(&3));
        assert_eq!(m.edges(), &[0, 2]);
        assert!(m.contains_edge(0));
        assert!(!m.contains_edge(1));
        assert_eq!(m.size(), 2);
        assert!(m.is_perfect());
        assert_eq!(m.weight(), 2.0);
    }

    #[test]
    fn test_partial_matching() {
        let g = path_graph();
        // Only (1,2) matched: edge 1.
        let matched = vec![None, Some(1), Some(1), None];
        let m = Matching::new(&g, matched, 1.0f64);
        assert!(!m.is_vertex_matched(&0).unwrap());
        assert_eq!(m.partner(&0).unwrap(), None);
        assert_eq!(m.matched_vertices(), &[1, 2]);
        assert_eq!(m.unmatched_vertices(), &[0, 3]);
        assert_eq!(m.size(), 1);
        assert!(!m.is_perfect());
    }

    #[test]
    fn test_unknown_vertex_is_an_error() {
        let g = path_graph();
        let m = Matching::new(&g, vec![None; 4], 0.0f64);
        assert!(matches!(
            m.is_vertex_matched(&9),
            Err(GraphError::VertexNotFound)
        ));
        assert!(matches!(m.partner(&9), Err(GraphError::VertexNotFound)));
    }

    #[test]
    fn test_accessors_are_idempotent() {
        let g = path_graph();
        let matched = vec![Some(0), Some(0), None, None];
        let m = Matching::new(&g, matched, 1.0f64);
        let first: Vec<usize> = m.edges().to_vec();
        let second: Vec<usize> = m.edges().to_vec();
        assert_eq!(first, second);
        assert_eq!(m.matched_vertices(), m.matched_vertices());
    }
}
