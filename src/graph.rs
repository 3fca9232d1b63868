use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{GraphError, Result};

/// A simple graph over arbitrary vertex identifiers.
///
/// Vertex identifiers are mapped to dense indices `0..n` and edges to
/// `0..m` as they are inserted. The matching engines run entirely on that
/// compact index space; the mapping kept here translates their results back
/// to caller-facing identifiers.
///
/// Self-loops and parallel edges are rejected on insertion, so every engine
/// may assume a simple graph.
#[derive(Clone, Debug)]
pub struct Graph<V> {
    directed: bool,
    ids: Vec<V>,
    index: HashMap<V, usize>,
    edges: Vec<(usize, usize)>,
    adj: Vec<Vec<(usize, usize)>>,
}

impl<V> Graph<V>
where
    V: Hash + Eq + Copy + Debug,
{
    /// Creates an empty directed graph.
    pub fn new() -> Self {
        Graph {
            directed: true,
            ids: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            adj: Vec::new(),
        }
    }

    /// Creates an empty undirected graph.
    pub fn new_undirected() -> Self {
        Graph {
            directed: false,
            ..Graph::new()
        }
    }

    /// Whether the graph was created as directed.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether `v` has been added to the graph.
    pub fn has_vertex(&self, v: &V) -> bool {
        self.index.contains_key(v)
    }

    /// Adds vertex `v` if not already present and returns its dense index.
    pub fn add_vertex(&mut self, v: V) -> usize {
        if let Some(&i) = self.index.get(&v) {
            return i;
        }
        let i = self.ids.len();
        self.ids.push(v);
        self.index.insert(v, i);
        self.adj.push(Vec::new());
        i
    }

    /// Adds an edge between `u` and `v`, inserting missing endpoints, and
    /// returns the edge index.
    ///
    /// # Errors
    /// * `InvalidInput` if the edge is a self-loop or duplicates an existing
    ///   edge.
    pub fn add_edge(&mut self, u: V, v: V) -> Result<usize> {
        if u == v {
            return Err(GraphError::invalid_input("self-loops are not allowed"));
        }
        let ui = self.add_vertex(u);
        let vi = self.add_vertex(v);
        let duplicate = self.adj[ui].iter().any(|&(w, _)| w == vi)
            || (!self.directed && self.adj[vi].iter().any(|&(w, _)| w == ui));
        if duplicate {
            return Err(GraphError::invalid_input("parallel edges are not allowed"));
        }
        let e = self.edges.len();
        self.edges.push((ui, vi));
        self.adj[ui].push((vi, e));
        if !self.directed {
            self.adj[vi].push((ui, e));
        }
        Ok(e)
    }

    /// Iterates over all vertex identifiers in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.ids.iter()
    }

    /// Dense index of vertex `v`.
    pub fn index_of(&self, v: &V) -> Option<usize> {
        self.index.get(v).copied()
    }

    /// Identifier of the vertex at dense index `i`.
    ///
    /// # Panics
    /// Panics if `i >= vertex_count()`.
    pub fn vertex_at(&self, i: usize) -> &V {
        &self.ids[i]
    }

    /// Endpoint identifiers of edge `e` as `(source, target)`.
    pub fn endpoints(&self, e: usize) -> Option<(&V, &V)> {
        self.edges
            .get(e)
            .map(|&(u, v)| (&self.ids[u], &self.ids[v]))
    }

    /// Endpoint indices of edge `e` as `(source, target)`.
    pub fn endpoint_indices(&self, e: usize) -> Option<(usize, usize)> {
        self.edges.get(e).copied()
    }

    /// Adjacency of the vertex at index `i`: `(neighbor index, edge index)`
    /// pairs.
    pub fn adjacency(&self, i: usize) -> &[(usize, usize)] {
        &self.adj[i]
    }

    /// All adjacency lists, indexed by vertex.
    pub(crate) fn adjacency_lists(&self) -> &[Vec<(usize, usize)>] {
        &self.adj
    }

    /// Neighbors of vertex `v` by identifier.
    ///
    /// # Errors
    /// * `VertexNotFound` if `v` is not in the graph.
    pub fn neighbors(&self, v: &V) -> Result<impl Iterator<Item = &V>> {
        let i = self.index_of(v).ok_or(GraphError::VertexNotFound)?;
        Ok(self.adj[i].iter().map(move |&(w, _)| &self.ids[w]))
    }

    /// Two-colors the graph with BFS. Returns the color of every vertex
    /// index, or `None` if some component contains an odd cycle.
    ///
    /// Only meaningful for undirected graphs; the facade never calls it on a
    /// directed one.
    pub fn bipartition(&self) -> Option<Vec<bool>> {
        let n = self.vertex_count();
        let mut color: Vec<Option<bool>> = vec![None; n];
        let mut queue = VecDeque::new();
        for start in 0..n {
            if color[start].is_some() {
                continue;
            }
            color[start] = Some(false);
            queue.push_back(start);
            while let Some(u) = queue.pop_front() {
                let cu = color[u].unwrap();
                for &(w, _) in &self.adj[u] {
                    match color[w] {
                        None => {
                            color[w] = Some(!cu);
                            queue.push_back(w);
                        }
                        Some(cw) if cw == cu => return None,
                        Some(_) => {}
                    }
                }
            }
        }
        Some(color.into_iter().map(|c| c.unwrap_or(false)).collect())
    }
}

impl<V> Default for Graph<V>
where
    V: Hash + Eq + Copy + Debug,
{
    fn default() -> Self {
        Graph::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_and_lookup() {
        let mut g = Graph::new_undirected();
        let e = g.add_edge("a", "b").unwrap();
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.endpoints(e), Some((&"a", &"b")));
        assert!(g.has_vertex(&"a"));
        assert!(!g.has_vertex(&"c"));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut g = Graph::new_undirected();
        assert!(matches!(
            g.add_edge(1, 1),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parallel_edge_rejected() {
        let mut g = Graph::new_undirected();
        g.add_edge(1, 2).unwrap();
        assert!(g.add_edge(2, 1).is_err());
        assert!(g.add_edge(1, 2).is_err());
    }

    #[test]
    fn test_adjacency_is_symmetric_when_undirected() {
        let mut g = Graph::new_undirected();
        g.add_edge(0, 1).unwrap();
        let i0 = g.index_of(&0).unwrap();
        let i1 = g.index_of(&1).unwrap();
        assert_eq!(g.adjacency(i0).len(), 1);
        assert_eq!(g.adjacency(i1).len(), 1);
    }

    #[test]
    fn test_bipartition_even_cycle() {
        let mut g = Graph::new_undirected();
        for i in 0..6 {
            g.add_edge(i, (i + 1) % 6).unwrap();
        }
        let colors = g.bipartition().unwrap();
        for e in 0..g.edge_count() {
            let (u, v) = g.endpoint_indices(e).unwrap();
            assert_ne!(colors[u], colors[v]);
        }
    }

    #[test]
    fn test_bipartition_odd_cycle() {
        let mut g = Graph::new_undirected();
        for i in 0..5 {
            g.add_edge(i, (i + 1) % 5).unwrap();
        }
        assert!(g.bipartition().is_none());
    }

    #[test]
    fn test_bipartition_isolated_vertices() {
        let mut g: Graph<u32> = Graph::new_undirected();
        g.add_vertex(7);
        g.add_vertex(8);
        assert!(g.bipartition().is_some());
    }
}
