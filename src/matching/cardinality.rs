use std::collections::VecDeque;

use log::debug;

use super::union_find::UnionFind;

const NONE: usize = usize::MAX;

/// Maximum cardinality matching in a general graph.
///
/// Runs phases of a breadth-first search started from all unmatched vertices
/// at once. Each phase grows a forest of alternating paths; odd cycles are
/// contracted on the fly by merging their vertices in a union-find keyed on
/// the cycle base. A phase ends as soon as an edge joins two trees with
/// different roots, which yields an augmenting path, or when the forest is
/// exhausted, which proves the matching maximum.
///
/// `adjacency[v]` lists `(neighbor, edge)` pairs; the return value maps each
/// vertex to its matched edge, or `None`.
pub(crate) fn maximum_cardinality_matching(
    n: usize,
    adjacency: &[Vec<(usize, usize)>],
) -> Vec<Option<usize>> {
    let mut state = Search::new(n);
    let mut matched = 0usize;
    while state.augment_phase(adjacency) {
        matched += 1;
    }
    debug!("cardinality matching finished with {} edges", matched);
    (0..n)
        .map(|v| {
            if state.mate[v] == NONE {
                None
            } else {
                Some(state.mate_edge[v])
            }
        })
        .collect()
}

struct Search {
    n: usize,
    /// Matched partner vertex, or NONE.
    mate: Vec<usize>,
    /// Edge index of the matched edge; valid where mate is set.
    mate_edge: Vec<usize>,
    /// Tree parent of an odd vertex. Rewritten along blossom cycles so that
    /// augmentation can run straight through contracted regions.
    parent: Vec<usize>,
    /// Edge through which `parent` was assigned.
    parent_edge: Vec<usize>,
    /// Root of the tree each visited vertex belongs to.
    root: Vec<usize>,
    even: Vec<bool>,
    odd: Vec<bool>,
    /// Blossom bases: all vertices of a contracted blossom share one set
    /// whose representative is the base.
    bases: UnionFind,
}

impl Search {
    fn new(n: usize) -> Self {
        Search {
            n,
            mate: vec![NONE; n],
            mate_edge: vec![NONE; n],
            parent: vec![NONE; n],
            parent_edge: vec![NONE; n],
            root: vec![NONE; n],
            even: vec![false; n],
            odd: vec![false; n],
            bases: UnionFind::new(n),
        }
    }

    /// Runs one search phase; returns true if an augmenting path was found
    /// and flipped.
    fn augment_phase(&mut self, adjacency: &[Vec<(usize, usize)>]) -> bool {
        self.bases.reset();
        for v in 0..self.n {
            self.parent[v] = NONE;
            self.parent_edge[v] = NONE;
            self.root[v] = NONE;
            self.even[v] = false;
            self.odd[v] = false;
        }

        let mut queue = VecDeque::new();
        for v in 0..self.n {
            if self.mate[v] == NONE {
                self.even[v] = true;
                self.root[v] = v;
                queue.push_back(v);
            }
        }

        while let Some(u) = queue.pop_front() {
            for &(to, e) in &adjacency[u] {
                if self.bases.find(u) == self.bases.find(to) || self.mate[u] == to {
                    continue;
                }
                if self.even[to] {
                    if self.root[u] == self.root[to] {
                        // Odd cycle within one tree: contract it.
                        self.contract_blossom(u, to, e, &mut queue);
                    } else {
                        // Two trees met: augment along both of them.
                        self.augment_through(u, to, e);
                        return true;
                    }
                } else if !self.odd[to] {
                    // Unvisited, hence matched: to becomes odd, its mate
                    // even.
                    self.parent[to] = u;
                    self.parent_edge[to] = e;
                    self.odd[to] = true;
                    self.root[to] = self.root[u];
                    let w = self.mate[to];
                    self.even[w] = true;
                    self.root[w] = self.root[u];
                    queue.push_back(w);
                }
            }
        }
        false
    }

    /// Base of the blossom closed by an edge between even vertices `u` and
    /// `to` in the same tree: the first common vertex of their paths to the
    /// root, in terms of current blossom bases.
    fn cycle_base(&mut self, u: usize, to: usize) -> usize {
        let mut seen = vec![false; self.n];
        let mut v = self.bases.find(u);
        loop {
            seen[v] = true;
            if self.mate[v] == NONE {
                break;
            }
            v = self.parent[self.mate[v]];
            v = self.bases.find(v);
        }
        let mut w = self.bases.find(to);
        while !seen[w] {
            w = self.parent[self.mate[w]];
            w = self.bases.find(w);
        }
        w
    }

    /// Rewrites parent pointers from `v` down to the base `b` so that the
    /// path through the new blossom alternates correctly, flagging every
    /// base on the way in `on_cycle`.
    fn mark_cycle_path(
        &mut self,
        mut v: usize,
        b: usize,
        mut bridge: usize,
        mut bridge_edge: usize,
        on_cycle: &mut [bool],
    ) {
        while self.bases.find(v) != b {
            on_cycle[self.bases.find(v)] = true;
            let m = self.mate[v];
            on_cycle[self.bases.find(m)] = true;
            self.parent[v] = bridge;
            self.parent_edge[v] = bridge_edge;
            // The mate's old tree edge becomes the next bridge.
            bridge = m;
            bridge_edge = self.parent_edge[m];
            v = self.parent[m];
        }
    }

    fn contract_blossom(&mut self, u: usize, to: usize, e: usize, queue: &mut VecDeque<usize>) {
        let base = self.cycle_base(u, to);
        let mut on_cycle = vec![false; self.n];
        self.mark_cycle_path(u, base, to, e, &mut on_cycle);
        self.mark_cycle_path(to, base, u, e, &mut on_cycle);

        // Vertices on the cycle join the base's set; formerly odd ones turn
        // even and get scanned. Membership is resolved before any union so
        // the flagged representatives stay valid.
        let members: Vec<usize> = (0..self.n)
            .filter(|&v| on_cycle[self.bases.find(v)])
            .collect();
        let phase_root = self.root[u];
        for v in members {
            if !self.even[v] {
                self.even[v] = true;
                self.root[v] = phase_root;
                queue.push_back(v);
            }
            self.bases.union_into(v, base);
        }
    }

    /// Flips matched edges up one alternating tree, starting from the odd
    /// vertex `start` (the old mate of an augmenting-path endpoint).
    fn rematch_up(&mut self, start: usize) {
        let mut o = start;
        while o != NONE {
            let p = self.parent[o];
            let pe = self.parent_edge[o];
            let next = self.mate[p];
            self.mate[o] = p;
            self.mate[p] = o;
            self.mate_edge[o] = pe;
            self.mate_edge[p] = pe;
            o = next;
        }
    }

    /// Augments along the path running through edge `e` between even
    /// vertices `u` and `to` of different trees.
    fn augment_through(&mut self, u: usize, to: usize, e: usize) {
        debug!("augment through edge {} = ({}, {})", e, u, to);
        let mu = self.mate[u];
        let mt = self.mate[to];
        if mu != NONE {
            self.rematch_up(mu);
        }
        if mt != NONE {
            self.rematch_up(mt);
        }
        self.mate[u] = to;
        self.mate[to] = u;
        self.mate_edge[u] = e;
        self.mate_edge[to] = e;
    }
}
