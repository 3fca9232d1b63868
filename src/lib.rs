//! Matching algorithms for undirected graphs.
//!
//! The crate computes maximum/minimum cardinality and weighted matchings in
//! general and bipartite graphs. The entry points in [`matching`] inspect the
//! input once and dispatch to the cheapest applicable engine: Hopcroft-Karp
//! for bipartite cardinality, successive shortest paths for bipartite
//! weights, a multi-root BFS blossom search for general cardinality, and a
//! primal-dual blossom algorithm for general weights.

pub mod error;
pub mod graph;
pub mod matching;

pub use error::{GraphError, Result};
pub use graph::Graph;
pub use matching::{
    maximum_matching, maximum_perfect_matching, minimum_matching, minimum_perfect_matching,
    EdgeWeights, Matching,
};
