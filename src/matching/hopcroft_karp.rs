use std::collections::VecDeque;

use log::debug;

const NONE: usize = usize::MAX;

/// Maximum cardinality matching in a bipartite graph by Hopcroft-Karp.
///
/// `left[v]` marks the side of each vertex; edges are only scanned from the
/// left. Each round runs one BFS building layers of shortest alternating
/// paths from all free left vertices, then one DFS pass that augments along
/// a maximal set of vertex-disjoint shortest paths. O(sqrt(V) * E) rounds
/// overall.
///
/// Returns the matched edge of every vertex, or `None`.
pub(crate) fn hopcroft_karp(
    n: usize,
    adjacency: &[Vec<(usize, usize)>],
    left: &[bool],
) -> Vec<Option<usize>> {
    let mut mate = vec![NONE; n];
    let mut mate_edge = vec![NONE; n];
    let mut dist = vec![NONE; n];
    let mut rounds = 0usize;

    loop {
        // Layer the graph by BFS from all free left vertices.
        let mut queue = VecDeque::new();
        for v in 0..n {
            if left[v] && mate[v] == NONE {
                dist[v] = 0;
                queue.push_back(v);
            } else {
                dist[v] = NONE;
            }
        }
        let mut reachable_free_right = false;
        while let Some(u) = queue.pop_front() {
            for &(v, _) in &adjacency[u] {
                let w = mate[v];
                if w == NONE {
                    reachable_free_right = true;
                } else if dist[w] == NONE {
                    dist[w] = dist[u] + 1;
                    queue.push_back(w);
                }
            }
        }
        if !reachable_free_right {
            break;
        }

        for u in 0..n {
            if left[u] && mate[u] == NONE {
                try_augment(u, adjacency, &mut mate, &mut mate_edge, &mut dist);
            }
        }
        rounds += 1;
    }
    debug!("hopcroft-karp finished after {} rounds", rounds);

    (0..n)
        .map(|v| if mate[v] == NONE { None } else { Some(mate_edge[v]) })
        .collect()
}

/// Depth-first search for one augmenting path from the free left vertex `u`,
/// restricted to the BFS layers. Flips the path if found.
fn try_augment(
    u: usize,
    adjacency: &[Vec<(usize, usize)>],
    mate: &mut [usize],
    mate_edge: &mut [usize],
    dist: &mut [usize],
) -> bool {
    for &(v, e) in &adjacency[u] {
        let w = mate[v];
        let extends = if w == NONE {
            true
        } else {
            dist[w] == dist[u].wrapping_add(1)
                && try_augment(w, adjacency, mate, mate_edge, dist)
        };
        if extends {
            mate[u] = v;
            mate[v] = u;
            mate_edge[u] = e;
            mate_edge[v] = e;
            return true;
        }
    }
    // Dead end; never revisit u this round.
    dist[u] = NONE;
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds adjacency and a left mask from edges given as (left, right)
    /// pairs over disjoint index ranges.
    fn setup(n: usize, left_count: usize, edges: &[(usize, usize)]) -> (Vec<Vec<(usize, usize)>>, Vec<bool>) {
        let mut adj = vec![Vec::new(); n];
        for (e, &(u, v)) in edges.iter().enumerate() {
            adj[u].push((v, e));
            adj[v].push((u, e));
        }
        let left = (0..n).map(|v| v < left_count).collect();
        (adj, left)
    }

    fn matching_size(n: usize, left_count: usize, edges: &[(usize, usize)]) -> usize {
        let (adj, left) = setup(n, left_count, edges);
        let mate_edges = hopcroft_karp(n, &adj, &left);
        for v in 0..n {
            if let Some(e) = mate_edges[v] {
                let (a, b) = edges[e];
                assert!(a == v || b == v);
                let w = if a == v { b } else { a };
                assert_eq!(mate_edges[w], Some(e));
            }
        }
        mate_edges.iter().flatten().count() / 2
    }

    #[test]
    fn test_empty() {
        assert_eq!(matching_size(0, 0, &[]), 0);
    }

    #[test]
    fn test_single_edge() {
        assert_eq!(matching_size(2, 1, &[(0, 1)]), 1);
    }

    #[test]
    fn test_path_of_four() {
        // 0-2, 1-2, 1-3: maximum is 2.
        assert_eq!(matching_size(4, 2, &[(0, 2), (1, 2), (1, 3)]), 2);
    }

    #[test]
    fn test_requires_augmenting_path() {
        // Greedy left-to-right can trap itself; the algorithm must reroute.
        let edges = [(0, 3), (0, 4), (1, 3), (2, 4)];
        assert_eq!(matching_size(5, 3, &edges), 2);
    }

    #[test]
    fn test_complete_bipartite() {
        let mut edges = Vec::new();
        for u in 0..4 {
            for v in 4..8 {
                edges.push((u, v));
            }
        }
        assert_eq!(matching_size(8, 4, &edges), 4);
    }

    #[test]
    fn test_unbalanced_sides() {
        let edges = [(0, 5), (1, 5), (2, 5), (3, 5), (4, 5), (0, 6)];
        assert_eq!(matching_size(7, 5, &edges), 2);
    }

    #[test]
    fn test_long_alternating_chain() {
        // A ladder where each augmentation displaces the previous pairing.
        let edges = [
            (0, 4),
            (1, 4),
            (1, 5),
            (2, 5),
            (2, 6),
            (3, 6),
            (3, 7),
        ];
        assert_eq!(matching_size(8, 4, &edges), 4);
    }

    #[test]
    fn test_random_against_brute_force() {
        use rand::prelude::*;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..60 {
            let l = rng.gen_range(1..6);
            let r = rng.gen_range(1..6);
            let n = l + r;
            let mut edges = Vec::new();
            for u in 0..l {
                for v in l..n {
                    if rng.gen_bool(0.4) {
                        edges.push((u, v));
                    }
                }
            }
            let got = matching_size(n, l, &edges);
            let want = brute_force_size(n, &edges);
            assert_eq!(got, want, "l = {}, r = {}, edges = {:?}", l, r, edges);
        }
    }

    fn brute_force_size(n: usize, edges: &[(usize, usize)]) -> usize {
        fn go(edges: &[(usize, usize)], used: &mut Vec<bool>, idx: usize) -> usize {
            if idx == edges.len() {
                return 0;
            }
            let skip = go(edges, used, idx + 1);
            let (i, j) = edges[idx];
            if !used[i] && !used[j] {
                used[i] = true;
                used[j] = true;
                let take = 1 + go(edges, used, idx + 1);
                used[i] = false;
                used[j] = false;
                skip.max(take)
            } else {
                skip
            }
        }
        let mut used = vec![false; n];
        go(edges, &mut used, 0)
    }
}
