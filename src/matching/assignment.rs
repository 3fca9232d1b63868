use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use log::debug;
use num_traits::Float;

use crate::error::{GraphError, Result};

const NONE: usize = usize::MAX;

/// Heap entry for the shortest-path search.
#[derive(Clone, Copy)]
struct Visit<W> {
    dist: W,
    node: usize,
}

impl<W: PartialOrd> Eq for Visit<W> {}

impl<W: PartialOrd> PartialEq for Visit<W> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<W: PartialOrd> PartialOrd for Visit<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // Reverse ordering for min-heap
        other.dist.partial_cmp(&self.dist)
    }
}

impl<W: PartialOrd> Ord for Visit<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Minimum-cost bipartite matching by successive shortest augmenting paths.
///
/// `edges` holds `(left, right, cost)` triples over dense per-side indices.
/// In `perfect` mode every left vertex must be matched to a real right
/// vertex and the search fails with [`GraphError::NoPerfectMatching`] when
/// that is impossible. Otherwise each left vertex gets a private zero-cost
/// fallback column, so a vertex stays unmatched exactly when every
/// alternative would raise the total cost.
///
/// Costs may be negative. A Bellman-Ford pass over the initial residual
/// graph seeds the node potentials; after that every augmentation runs
/// Dijkstra on reduced costs, which the potential update keeps non-negative.
/// One augmentation per left vertex, O(L * (E log V)) overall.
///
/// Returns, for each left vertex, the position in `edges` of its matched
/// edge.
pub(crate) fn min_cost_bipartite<W>(
    num_left: usize,
    num_right: usize,
    edges: &[(usize, usize, W)],
    perfect: bool,
) -> Result<Vec<Option<usize>>>
where
    W: Float + Debug,
{
    // Node space: lefts, real rights, then one fallback column per left.
    let columns = if perfect {
        num_right
    } else {
        num_right + num_left
    };
    let total = num_left + columns;

    // Arcs as (left, column, cost, original edge position).
    let mut arcs: Vec<(usize, usize, W, usize)> = edges
        .iter()
        .enumerate()
        .map(|(k, &(u, v, c))| (u, v, c, k))
        .collect();
    if !perfect {
        for u in 0..num_left {
            arcs.push((u, num_right + u, W::zero(), NONE));
        }
    }
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); num_left];
    for (a, &(u, _, _, _)) in arcs.iter().enumerate() {
        adj[u].push(a);
    }

    // Bellman-Ford on the initial residual graph: lefts sit at distance
    // zero, columns at the cheapest incoming cost. Settles in two passes
    // because the graph is layered, but negative costs make it necessary.
    let mut pi = vec![W::zero(); total];
    let mut changed = true;
    while changed {
        changed = false;
        for &(u, v, c, _) in &arcs {
            if pi[u] + c < pi[num_left + v] {
                pi[num_left + v] = pi[u] + c;
                changed = true;
            }
        }
    }

    let mut mate_of_column = vec![NONE; columns];
    let mut arc_of_column = vec![NONE; columns];
    let mut mate_of_left = vec![NONE; num_left];
    let mut arc_of_left = vec![NONE; num_left];
    let mut dist = vec![W::infinity(); total];
    let mut reach_arc = vec![NONE; columns];

    for s in 0..num_left {
        // Dijkstra over reduced costs from the single free left vertex s.
        for d in dist.iter_mut() {
            *d = W::infinity();
        }
        for r in reach_arc.iter_mut() {
            *r = NONE;
        }
        dist[s] = W::zero();
        let mut heap = BinaryHeap::new();
        heap.push(Visit {
            dist: W::zero(),
            node: s,
        });
        while let Some(Visit { dist: d, node }) = heap.pop() {
            if d > dist[node] {
                continue;
            }
            if node >= num_left {
                let col = node - num_left;
                if mate_of_column[col] == NONE {
                    // Candidate path endpoint; no residual arcs leave it.
                    continue;
                }
                // Step back over the matched arc at zero reduced cost.
                let a = arc_of_column[col];
                let (u, _, c, _) = arcs[a];
                let nd = d - c + pi[node] - pi[u];
                if nd < dist[u] {
                    dist[u] = nd;
                    heap.push(Visit { dist: nd, node: u });
                }
            } else {
                for &a in &adj[node] {
                    let (_, v, c, _) = arcs[a];
                    let col_node = num_left + v;
                    if mate_of_column[v] != NONE && arc_of_column[v] == a {
                        continue;
                    }
                    let nd = d + c + pi[node] - pi[col_node];
                    if nd < dist[col_node] {
                        dist[col_node] = nd;
                        reach_arc[v] = a;
                        heap.push(Visit {
                            dist: nd,
                            node: col_node,
                        });
                    }
                }
            }
        }

        // Reduced distances are not comparable across free columns, since
        // each column carries its own potential; the true path cost
        // dist + pi decides.
        let mut target = NONE;
        let mut target_dist = W::zero();
        let mut target_cost = W::infinity();
        for col in 0..columns {
            let node = num_left + col;
            if mate_of_column[col] != NONE || dist[node] == W::infinity() {
                continue;
            }
            let cost = dist[node] + pi[node];
            if target == NONE || cost < target_cost {
                target = col;
                target_dist = dist[node];
                target_cost = cost;
            }
        }
        if target == NONE {
            debug!("left vertex {} has no augmenting path", s);
            return Err(GraphError::NoPerfectMatching);
        }

        // Flip the path from the target column back to s; every left vertex
        // on it hands its previous column to the next segment.
        let mut col = target;
        loop {
            let a = reach_arc[col];
            let u = arcs[a].0;
            let prev_col = mate_of_left[u];
            mate_of_column[col] = u;
            arc_of_column[col] = a;
            mate_of_left[u] = col;
            arc_of_left[u] = a;
            if prev_col == NONE {
                break;
            }
            col = prev_col;
        }

        // Keep reduced costs non-negative for the next round.
        for (x, p) in pi.iter_mut().enumerate() {
            *p = *p + dist[x].min(target_dist);
        }
    }

    Ok((0..num_left)
        .map(|u| {
            let a = arc_of_left[u];
            if a == NONE {
                return None;
            }
            let k = arcs[a].3;
            if k == NONE {
                // Fallback column: the vertex stays unmatched.
                None
            } else {
                Some(k)
            }
        })
        .collect())
}
