use std::fmt::Debug;

use log::{debug, trace};
use num_traits::Float;

use super::lca::LcaForest;

/// Sentinel for "no vertex / no edge / no endpoint".
const NONE: usize = usize::MAX;

/// Label of a top-level blossom in the alternating forest.
///
/// Vertices inside an odd blossom also carry an individual label once they
/// are reachable from outside the blossom; that is needed to relabel the
/// blossom correctly when it expands mid-stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Free,
    Even,
    Odd,
}

/// The next structural event of the primal-dual schedule, together with the
/// dual adjustment that makes it fire.
///
/// `Bound` is the termination event: the minimum vertex dual reaches zero
/// (or, in maximum-cardinality mode, no other event remains).
#[derive(Debug, Clone, Copy)]
enum DualStep {
    Bound,
    Grow(usize),
    Blossom(usize),
    Expand(usize),
}

/// Maximum weighted matching in a general graph by the primal-dual blossom
/// method.
///
/// Vertices are `0..n`; non-trivial blossoms are `n..2n`. Edge endpoints are
/// numbered `0..2m` so that endpoints `2k` and `2k+1` belong to edge `k`,
/// which lets a single xor flip an endpoint to its twin. Vertex duals are
/// stored pre-multiplied by two so that every quantity the algorithm
/// compares stays on the half-integer grid of the input weights; with
/// integer-valued weights all arithmetic is exact.
///
/// A search stage grows alternating trees from all unmatched vertices and
/// ends when an augmenting path is found or no dual adjustment can make
/// further progress. Within a stage the engine fires grow, blossom, expand
/// and augment events; blossoms are discovered by querying an incrementally
/// maintained LCA forest over the even blossoms of the current trees.
pub(crate) struct WeightedBlossom<W> {
    num_vertices: usize,
    num_edges: usize,
    edges: Vec<(usize, usize)>,
    weights: Vec<W>,
    max_cardinality: bool,

    /// endpoint[p] is the vertex to which endpoint p is attached.
    endpoint: Vec<usize>,
    /// adj_endpoints[v] lists the remote endpoints of v's incident edges.
    adj_endpoints: Vec<Vec<usize>>,
    /// mate[v] is the remote endpoint of v's matched edge, or NONE.
    mate: Vec<usize>,
    /// Label of each vertex/blossom; see [`Label`].
    label: Vec<Label>,
    /// Remote endpoint of the edge through which the label was obtained.
    label_end: Vec<usize>,
    /// Top-level blossom containing each vertex.
    in_blossom: Vec<usize>,
    /// Immediate parent of a sub-blossom, NONE for top-level ones.
    blossom_parent: Vec<usize>,
    /// Ordered sub-blossom cycle of a non-trivial blossom, base first.
    blossom_children: Vec<Vec<usize>>,
    /// Base vertex of each blossom.
    blossom_base: Vec<usize>,
    /// Connecting endpoints of the sub-blossom cycle;
    /// blossom_endpoints[b][i] is the endpoint of children[i] on the edge to
    /// children[i + 1].
    blossom_endpoints: Vec<Vec<usize>>,
    /// Least-slack candidate edge per free vertex / per even blossom; this
    /// is the event schedule for grow and blossom events.
    best_edge: Vec<usize>,
    /// Per non-trivial even blossom: least-slack edges to other even
    /// blossoms.
    blossom_best_edges: Vec<Vec<usize>>,
    unused_blossoms: Vec<usize>,
    /// dual[v] = 2u(v) for vertices, z(b) for blossoms.
    dual: Vec<W>,
    /// allowed[k]: edge k is known to be tight.
    allowed: Vec<bool>,
    /// Scan worklist of newly even vertices.
    pending: Vec<usize>,

    /// LCA forest over the even blossoms of the current stage.
    lca: LcaForest,
    /// Forest node of each top-level even blossom, or NONE.
    lca_node: Vec<usize>,
    /// Top-level blossom currently owning each forest node.
    node_owner: Vec<usize>,
    /// All forest nodes created inside each blossom, for ownership transfer
    /// on contraction.
    member_nodes: Vec<Vec<usize>>,
}

impl<W> WeightedBlossom<W>
where
    W: Float + Debug,
{
    pub(crate) fn new(
        num_vertices: usize,
        edges: Vec<(usize, usize)>,
        weights: Vec<W>,
        max_cardinality: bool,
    ) -> Self {
        let n = num_vertices;
        let m = edges.len();
        let endpoint: Vec<usize> = (0..2 * m)
            .map(|p| if p % 2 == 0 { edges[p / 2].0 } else { edges[p / 2].1 })
            .collect();
        let mut adj_endpoints = vec![Vec::new(); n];
        for (k, &(i, j)) in edges.iter().enumerate() {
            adj_endpoints[i].push(2 * k + 1);
            adj_endpoints[j].push(2 * k);
        }
        let max_weight = weights
            .iter()
            .fold(W::zero(), |acc, &w| acc.max(w));
        let mut blossom_base: Vec<usize> = (0..n).collect();
        blossom_base.extend(vec![NONE; n]);
        let mut dual = vec![max_weight; n];
        dual.extend(vec![W::zero(); n]);

        WeightedBlossom {
            num_vertices: n,
            num_edges: m,
            edges,
            weights,
            max_cardinality,
            endpoint,
            adj_endpoints,
            mate: vec![NONE; n],
            label: vec![Label::Free; 2 * n],
            label_end: vec![NONE; 2 * n],
            in_blossom: (0..n).collect(),
            blossom_parent: vec![NONE; 2 * n],
            blossom_children: vec![Vec::new(); 2 * n],
            blossom_base,
            blossom_endpoints: vec![Vec::new(); 2 * n],
            best_edge: vec![NONE; 2 * n],
            blossom_best_edges: vec![Vec::new(); 2 * n],
            unused_blossoms: (n..2 * n).collect(),
            dual,
            allowed: vec![false; m],
            pending: Vec::new(),
            lca: LcaForest::new(),
            lca_node: vec![NONE; 2 * n],
            node_owner: Vec::new(),
            member_nodes: vec![Vec::new(); 2 * n],
        }
    }

    /// 2 * slack of edge k. Not meaningful for edges inside a blossom.
    fn slack(&self, k: usize) -> W {
        let (i, j) = self.edges[k];
        let wt = self.weights[k];
        self.dual[i] + self.dual[j] - (wt + wt)
    }

    /// Leaf vertices of (sub-)blossom b, in left-to-right cycle order.
    fn blossom_leaves(&self, b: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![b];
        while let Some(t) = stack.pop() {
            if t < self.num_vertices {
                leaves.push(t);
            } else {
                // Reversed push keeps the pop order equal to child order.
                stack.extend(self.blossom_children[t].iter().rev().copied());
            }
        }
        leaves
    }

    /// Registers a fresh LCA node for the even top-level blossom `b`.
    ///
    /// `p` is the remote endpoint through which `b` got its label (NONE for
    /// a tree root). The parent node is the even blossom two tree levels up:
    /// the one that labeled the odd blossom below `b`.
    fn attach_lca_node(&mut self, b: usize, p: usize) {
        let node = if p == NONE {
            self.lca.add_root()
        } else {
            let odd_b = self.in_blossom[self.endpoint[p]];
            let parent_even = self.in_blossom[self.endpoint[self.label_end[odd_b]]];
            self.lca.add_leaf(self.lca_node[parent_even])
        };
        self.lca_node[b] = node;
        self.node_owner.push(b);
        self.member_nodes[b].push(node);
    }

    /// Assigns label `t` to the top-level blossom containing vertex `w`,
    /// reached through the edge with remote endpoint `p`.
    fn assign_label(&mut self, w: usize, t: Label, p: usize) {
        let b = self.in_blossom[w];
        debug_assert!(self.label[w] == Label::Free && self.label[b] == Label::Free);
        self.label[w] = t;
        self.label[b] = t;
        self.label_end[w] = p;
        self.label_end[b] = p;
        self.best_edge[w] = NONE;
        self.best_edge[b] = NONE;
        match t {
            Label::Even => {
                // b joins the forest of even blossoms; all its vertices can
                // now be scanned.
                self.attach_lca_node(b, p);
                let leaves = self.blossom_leaves(b);
                self.pending.extend(leaves);
            }
            Label::Odd => {
                // b became odd; its base has an external mate which becomes
                // even in turn.
                let base = self.blossom_base[b];
                debug_assert!(self.mate[base] != NONE);
                let mate_end = self.mate[base];
                let partner = self.endpoint[mate_end];
                self.assign_label(partner, Label::Even, mate_end ^ 1);
            }
            Label::Free => unreachable!(),
        }
    }

    /// Contracts the odd cycle closed by edge `k` into a new blossom with
    /// base vertex `base`. The new blossom is even with dual zero; odd
    /// sub-blossoms on the cycle turn even and their vertices are enqueued.
    fn add_blossom(&mut self, base: usize, k: usize) {
        let (mut v, mut w) = self.edges[k];
        let bb = self.in_blossom[base];
        let mut bv = self.in_blossom[v];
        let mut bw = self.in_blossom[w];

        let b = match self.unused_blossoms.pop() {
            Some(b) => b,
            // Cannot happen: at most n/2 non-trivial blossoms are alive.
            None => unreachable!("blossom arena exhausted"),
        };
        trace!("contract blossom {} with base {}", b, base);
        self.blossom_base[b] = base;
        self.blossom_parent[b] = NONE;
        self.blossom_parent[bb] = b;

        let mut children = Vec::new();
        let mut endpoints = Vec::new();

        // Trace back from v to the base.
        while bv != bb {
            self.blossom_parent[bv] = b;
            children.push(bv);
            endpoints.push(self.label_end[bv]);
            debug_assert!(self.label_end[bv] != NONE);
            v = self.endpoint[self.label_end[bv]];
            bv = self.in_blossom[v];
        }
        children.push(bb);
        children.reverse();
        endpoints.reverse();
        endpoints.push(2 * k);

        // Trace back from w to the base.
        while bw != bb {
            self.blossom_parent[bw] = b;
            children.push(bw);
            endpoints.push(self.label_end[bw] ^ 1);
            debug_assert!(self.label_end[bw] != NONE);
            w = self.endpoint[self.label_end[bw]];
            bw = self.in_blossom[w];
        }

        debug_assert!(self.label[bb] == Label::Even);
        self.label[b] = Label::Even;
        self.label_end[b] = self.label_end[bb];
        self.dual[b] = W::zero();
        // The cycle must be in place before leaves are enumerated below.
        self.blossom_children[b] = children.clone();
        self.blossom_endpoints[b] = endpoints;

        // The contracted blossom takes over the forest position of its base
        // sub-blossom, and every node created inside the cycle now resolves
        // to b.
        self.lca_node[b] = self.lca_node[bb];
        let mut absorbed = Vec::new();
        for &child in &children {
            absorbed.append(&mut self.member_nodes[child]);
        }
        for &node in &absorbed {
            self.node_owner[node] = b;
        }
        self.member_nodes[b] = absorbed;

        for v in self.blossom_leaves(b) {
            if self.label[self.in_blossom[v]] == Label::Odd {
                // Odd vertex turns even by becoming part of an even blossom.
                self.pending.push(v);
            }
            self.in_blossom[v] = b;
        }

        // Recompute least-slack candidate edges for the new blossom.
        let mut best_edge_to = vec![NONE; 2 * self.num_vertices];
        for &child in &children {
            let lists: Vec<Vec<usize>> = if self.blossom_best_edges[child].is_empty() {
                self.blossom_leaves(child)
                    .into_iter()
                    .map(|v| self.adj_endpoints[v].iter().map(|p| p / 2).collect())
                    .collect()
            } else {
                vec![self.blossom_best_edges[child].clone()]
            };
            for list in lists {
                for k in list {
                    let (mut i, mut j) = self.edges[k];
                    if self.in_blossom[j] == b {
                        std::mem::swap(&mut i, &mut j);
                    }
                    let bj = self.in_blossom[j];
                    if bj != b
                        && self.label[bj] == Label::Even
                        && (best_edge_to[bj] == NONE
                            || self.slack(k) < self.slack(best_edge_to[bj]))
                    {
                        best_edge_to[bj] = k;
                    }
                }
            }
            self.blossom_best_edges[child] = Vec::new();
            self.best_edge[child] = NONE;
        }
        self.blossom_best_edges[b] = best_edge_to.into_iter().filter(|&k| k != NONE).collect();
        self.best_edge[b] = NONE;
        for i in 0..self.blossom_best_edges[b].len() {
            let k = self.blossom_best_edges[b][i];
            if self.best_edge[b] == NONE || self.slack(k) < self.slack(self.best_edge[b]) {
                self.best_edge[b] = k;
            }
        }

    }

    /// Cycle indexing with Python-style negative offsets.
    fn cycle_get(list: &[usize], j: i64) -> usize {
        let len = list.len() as i64;
        let idx = ((j % len) + len) % len;
        list[idx as usize]
    }

    /// Expands the top-level blossom `b` back into its sub-blossoms.
    ///
    /// At the end of a stage (`end_stage`) sub-blossoms with zero dual are
    /// expanded as well, via a worklist rather than recursion. Mid-stage
    /// expansion of an odd blossom relabels the sub-blossoms along the path
    /// through which `b` obtained its label.
    fn expand_blossom(&mut self, b: usize, end_stage: bool) {
        let mut work = vec![b];
        while let Some(b) = work.pop() {
            self.expand_one(b, end_stage, &mut work);
        }
    }

    fn expand_one(&mut self, b: usize, end_stage: bool, work: &mut Vec<usize>) {
        trace!("expand blossom {} (end_stage: {})", b, end_stage);
        for s in self.blossom_children[b].clone() {
            self.blossom_parent[s] = NONE;
            if s < self.num_vertices {
                self.in_blossom[s] = s;
            } else if end_stage && self.dual[s] == W::zero() {
                work.push(s);
                // Leaves are rewritten when s itself is expanded.
                for v in self.blossom_leaves(s) {
                    self.in_blossom[v] = s;
                }
            } else {
                for v in self.blossom_leaves(s) {
                    self.in_blossom[v] = s;
                }
            }
        }

        // An odd blossom expanded mid-stage passes its label on to the
        // sub-blossoms on the path between its entry point and its base.
        if !end_stage && self.label[b] == Label::Odd {
            debug_assert!(self.label_end[b] != NONE);
            let entry_child = self.in_blossom[self.endpoint[self.label_end[b] ^ 1]];
            let children = self.blossom_children[b].clone();
            let endpoints = self.blossom_endpoints[b].clone();
            let mut j = children
                .iter()
                .position(|&r| r == entry_child)
                .map(|i| i as i64)
                .unwrap_or(0);
            let (j_step, endpoint_trick): (i64, usize) = if j & 1 != 0 {
                // Odd entry index: go forward around the cycle.
                j -= children.len() as i64;
                (1, 0)
            } else {
                // Even entry index: go backward.
                (-1, 1)
            };

            let mut p = self.label_end[b];
            while j != 0 {
                // Relabel the odd sub-blossom.
                self.label[self.endpoint[p ^ 1]] = Label::Free;
                let q = Self::cycle_get(&endpoints, j - endpoint_trick as i64)
                    ^ endpoint_trick
                    ^ 1;
                self.label[self.endpoint[q]] = Label::Free;
                let ep = self.endpoint[p ^ 1];
                self.assign_label(ep, Label::Odd, p);

                // The edges along the cycle are tight by construction.
                self.allowed[Self::cycle_get(&endpoints, j - endpoint_trick as i64) / 2] = true;
                j += j_step;
                p = Self::cycle_get(&endpoints, j - endpoint_trick as i64) ^ endpoint_trick;
                self.allowed[p / 2] = true;
                j += j_step;
            }

            // The base sub-blossom keeps the odd label without stepping
            // through to its mate.
            let bv = Self::cycle_get(&children, j);
            self.label[self.endpoint[p ^ 1]] = Label::Odd;
            self.label[bv] = Label::Odd;
            self.label_end[self.endpoint[p ^ 1]] = p;
            self.label_end[bv] = p;
            self.best_edge[bv] = NONE;

            // The remaining sub-blossoms are relabeled from outside if some
            // of their vertices were reached, and left free otherwise.
            j += j_step;
            while Self::cycle_get(&children, j) != entry_child {
                let bv = Self::cycle_get(&children, j);
                if self.label[bv] == Label::Even {
                    j += j_step;
                    continue;
                }
                let mut reached = NONE;
                for v in self.blossom_leaves(bv) {
                    if self.label[v] != Label::Free {
                        reached = v;
                        break;
                    }
                }
                if reached != NONE {
                    debug_assert!(self.label[reached] == Label::Odd);
                    debug_assert!(self.in_blossom[reached] == bv);
                    self.label[reached] = Label::Free;
                    let base_mate = self.mate[self.blossom_base[bv]];
                    self.label[self.endpoint[base_mate]] = Label::Free;
                    let through = self.label_end[reached];
                    self.assign_label(reached, Label::Odd, through);
                }
                j += j_step;
            }
        }

        // Recycle the blossom slot.
        self.label[b] = Label::Free;
        self.label_end[b] = NONE;
        self.blossom_base[b] = NONE;
        self.best_edge[b] = NONE;
        self.blossom_children[b] = Vec::new();
        self.blossom_endpoints[b] = Vec::new();
        self.blossom_best_edges[b] = Vec::new();
        self.unused_blossoms.push(b);
    }

    /// Flips matched/unmatched edges on the alternating path inside blossom
    /// `b` between vertex `v` and the blossom base, then rotates the cycle
    /// so `v` becomes the new base. Nested blossoms are handled through an
    /// explicit work stack.
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut work = vec![(b, v)];
        while let Some((b, v)) = work.pop() {
            self.augment_blossom_one(b, v, &mut work);
        }
    }

    fn augment_blossom_one(&mut self, b: usize, v: usize, work: &mut Vec<(usize, usize)>) {
        // Immediate sub-blossom of b containing v.
        let mut t = v;
        while self.blossom_parent[t] != b {
            t = self.blossom_parent[t];
        }
        if t >= self.num_vertices {
            work.push((t, v));
        }

        let children = self.blossom_children[b].clone();
        let endpoints = self.blossom_endpoints[b].clone();
        let i = children.iter().position(|&r| r == t).unwrap_or(0);
        let mut j = i as i64;
        let (j_step, endpoint_trick): (i64, usize) = if i & 1 != 0 {
            j -= children.len() as i64;
            (1, 0)
        } else {
            (-1, 1)
        };

        // Walk the cycle from t to the base, matching every second edge.
        while j != 0 {
            j += j_step;
            let t1 = Self::cycle_get(&children, j);
            let p = Self::cycle_get(&endpoints, j - endpoint_trick as i64) ^ endpoint_trick;
            if t1 >= self.num_vertices {
                work.push((t1, self.endpoint[p]));
            }
            j += j_step;
            let t2 = Self::cycle_get(&children, j);
            if t2 >= self.num_vertices {
                work.push((t2, self.endpoint[p ^ 1]));
            }
            self.mate[self.endpoint[p]] = p ^ 1;
            self.mate[self.endpoint[p ^ 1]] = p;
        }

        // Rotate so the entry sub-blossom becomes the base. The entry vertex
        // is the new base; sub-blossom rotations still on the work stack
        // will agree once they run.
        self.blossom_children[b].rotate_left(i);
        self.blossom_endpoints[b].rotate_left(i);
        self.blossom_base[b] = v;
    }

    /// Flips the augmenting path that runs through the tight edge `k`
    /// between two even vertices in different trees.
    fn augment_matching(&mut self, k: usize) {
        let (v, w) = self.edges[k];
        debug!("augment through edge {} = ({}, {})", k, v, w);
        for (start, start_end) in [(v, 2 * k + 1), (w, 2 * k)] {
            let mut s = start;
            let mut p = start_end;
            // Match s to the remote endpoint p, then trace back until an
            // unmatched vertex is reached, swapping edges as we go.
            loop {
                let bs = self.in_blossom[s];
                debug_assert!(self.label[bs] == Label::Even);
                debug_assert!(self.label_end[bs] == self.mate[self.blossom_base[bs]]);
                if bs >= self.num_vertices {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = p;

                if self.label_end[bs] == NONE {
                    // Tree root: augmentation on this side is complete.
                    break;
                }
                let t = self.endpoint[self.label_end[bs]];
                let bt = self.in_blossom[t];
                debug_assert!(self.label[bt] == Label::Odd);
                debug_assert!(self.label_end[bt] != NONE);
                s = self.endpoint[self.label_end[bt]];
                let j = self.endpoint[self.label_end[bt] ^ 1];
                debug_assert!(self.blossom_base[bt] == t);
                if bt >= self.num_vertices {
                    self.augment_blossom(bt, j);
                }
                self.mate[j] = self.label_end[bt];
                p = self.label_end[bt] ^ 1;
            }
        }
    }

    /// Picks the minimum-delta event among termination bound, grow, blossom
    /// and expand candidates.
    fn next_dual_step(&self) -> Option<(W, DualStep)> {
        let n = self.num_vertices;
        let mut best: Option<(W, DualStep)> = None;

        if !self.max_cardinality {
            let bound = self.dual[..n]
                .iter()
                .fold(W::infinity(), |acc, &d| acc.min(d));
            best = Some((bound, DualStep::Bound));
        }

        // Grow: least-slack edge from an even vertex to a free vertex.
        for v in 0..n {
            if self.label[self.in_blossom[v]] == Label::Free && self.best_edge[v] != NONE {
                let d = self.slack(self.best_edge[v]);
                if best.map_or(true, |(delta, _)| d < delta) {
                    best = Some((d, DualStep::Grow(self.best_edge[v])));
                }
            }
        }

        // Blossom: half the least slack between two even blossoms.
        let two = W::one() + W::one();
        for b in 0..2 * n {
            if self.blossom_parent[b] == NONE
                && self.label[b] == Label::Even
                && self.best_edge[b] != NONE
            {
                let d = self.slack(self.best_edge[b]) / two;
                if best.map_or(true, |(delta, _)| d < delta) {
                    best = Some((d, DualStep::Blossom(self.best_edge[b])));
                }
            }
        }

        // Expand: an odd blossom whose dual is about to reach zero.
        for b in n..2 * n {
            if self.blossom_base[b] != NONE
                && self.blossom_parent[b] == NONE
                && self.label[b] == Label::Odd
                && best.map_or(true, |(delta, _)| self.dual[b] < delta)
            {
                best = Some((self.dual[b], DualStep::Expand(b)));
            }
        }

        best
    }

    /// Adjusts all duals by `delta`: even blossoms rise, odd blossoms fall.
    ///
    /// `delta` lives in the same doubled domain as the stored duals, so both
    /// vertex and blossom updates apply it directly.
    fn apply_delta(&mut self, delta: W) {
        let n = self.num_vertices;
        for v in 0..n {
            match self.label[self.in_blossom[v]] {
                Label::Free => {}
                Label::Even => self.dual[v] = self.dual[v] - delta,
                Label::Odd => self.dual[v] = self.dual[v] + delta,
            }
        }
        for b in n..2 * n {
            if self.blossom_base[b] != NONE && self.blossom_parent[b] == NONE {
                match self.label[b] {
                    Label::Free => {}
                    Label::Even => self.dual[b] = self.dual[b] + delta,
                    Label::Odd => self.dual[b] = self.dual[b] - delta,
                }
            }
        }
    }

    /// Scans pending even vertices; returns true if the matching was
    /// augmented.
    fn scan(&mut self) -> bool {
        while let Some(v) = self.pending.pop() {
            debug_assert!(self.label[self.in_blossom[v]] == Label::Even);
            for p in self.adj_endpoints[v].clone() {
                let k = p / 2;
                let w = self.endpoint[p];
                if self.in_blossom[v] == self.in_blossom[w] {
                    // Internal to a blossom.
                    continue;
                }
                let mut k_slack = W::zero();
                if !self.allowed[k] {
                    k_slack = self.slack(k);
                    if k_slack <= W::zero() {
                        self.allowed[k] = true;
                    }
                }
                if self.allowed[k] {
                    let bw = self.in_blossom[w];
                    if self.label[bw] == Label::Free {
                        // Grow event: w becomes odd, its mate even.
                        self.assign_label(w, Label::Odd, p ^ 1);
                    } else if self.label[bw] == Label::Even {
                        // Both ends even: either a blossom closes inside one
                        // tree, or the trees are distinct and the edge
                        // completes an augmenting path.
                        let bv = self.in_blossom[v];
                        match self
                            .lca
                            .lowest_common_ancestor(self.lca_node[bv], self.lca_node[bw])
                        {
                            Some(node) => {
                                let base = self.blossom_base[self.node_owner[node]];
                                self.add_blossom(base, k);
                            }
                            None => {
                                self.augment_matching(k);
                                return true;
                            }
                        }
                    } else if self.label[w] == Label::Free {
                        // w sits inside an odd blossom and is now reachable
                        // from outside; remember the entry for expansion.
                        debug_assert!(self.label[bw] == Label::Odd);
                        self.label[w] = Label::Odd;
                        self.label_end[w] = p ^ 1;
                    }
                } else if self.label[self.in_blossom[w]] == Label::Even {
                    // Track the least-slack edge between even blossoms.
                    let bv = self.in_blossom[v];
                    if self.best_edge[bv] == NONE || k_slack < self.slack(self.best_edge[bv]) {
                        self.best_edge[bv] = k;
                    }
                } else if self.label[w] == Label::Free
                    && (self.best_edge[w] == NONE || k_slack < self.slack(self.best_edge[w]))
                {
                    // Track the least-slack edge reaching a free vertex.
                    self.best_edge[w] = k;
                }
            }
        }
        false
    }

    /// Runs the algorithm to completion.
    pub(crate) fn solve(&mut self) {
        if self.num_edges == 0 {
            return;
        }
        let n = self.num_vertices;

        for stage in 0..n {
            // A stage searches for one augmenting path and uses it to grow
            // the matching by one edge.
            debug!("stage {} begins", stage);
            self.label = vec![Label::Free; 2 * n];
            self.best_edge = vec![NONE; 2 * n];
            for b in n..2 * n {
                self.blossom_best_edges[b] = Vec::new();
            }
            self.allowed = vec![false; self.num_edges];
            self.pending.clear();
            self.lca.clear();
            self.node_owner.clear();
            for b in 0..2 * n {
                self.lca_node[b] = NONE;
                self.member_nodes[b].clear();
            }

            for v in 0..n {
                if self.mate[v] == NONE && self.label[self.in_blossom[v]] == Label::Free {
                    self.assign_label(v, Label::Even, NONE);
                }
            }

            let mut augmented = false;
            loop {
                // A substage: scan for a structural event under the current
                // duals, and failing that pump slack out of the problem.
                if self.scan() {
                    augmented = true;
                    break;
                }

                let (delta, step) = match self.next_dual_step() {
                    Some(found) => found,
                    None => {
                        // Only possible in maximum-cardinality mode: no
                        // event remains, terminate with a final bound
                        // adjustment so the duals witness optimality.
                        debug_assert!(self.max_cardinality);
                        let bound = self.dual[..n]
                            .iter()
                            .fold(W::infinity(), |acc, &d| acc.min(d))
                            .max(W::zero());
                        (bound, DualStep::Bound)
                    }
                };
                self.apply_delta(delta);

                match step {
                    DualStep::Bound => break,
                    DualStep::Grow(k) => {
                        // The least-slack edge went tight; resume scanning
                        // from its even endpoint.
                        self.allowed[k] = true;
                        let (i, j) = self.edges[k];
                        let i = if self.label[self.in_blossom[i]] == Label::Free {
                            j
                        } else {
                            i
                        };
                        debug_assert!(self.label[self.in_blossom[i]] == Label::Even);
                        self.pending.push(i);
                    }
                    DualStep::Blossom(k) => {
                        self.allowed[k] = true;
                        let (i, _) = self.edges[k];
                        debug_assert!(self.label[self.in_blossom[i]] == Label::Even);
                        self.pending.push(i);
                    }
                    DualStep::Expand(b) => {
                        self.expand_blossom(b, false);
                    }
                }
            }

            if !augmented {
                break;
            }

            // End of stage: expand even blossoms whose dual dropped to zero.
            for b in n..2 * n {
                if self.blossom_parent[b] == NONE
                    && self.blossom_base[b] != NONE
                    && self.label[b] == Label::Even
                    && self.dual[b] == W::zero()
                {
                    self.expand_blossom(b, true);
                }
            }
        }
    }

    /// Partner vertex of `v` in the final matching.
    #[cfg(test)]
    fn mate_vertex(&self, v: usize) -> Option<usize> {
        if self.mate[v] == NONE {
            None
        } else {
            Some(self.endpoint[self.mate[v]])
        }
    }

    /// Matched edge of `v` in the final matching.
    pub(crate) fn mate_edge(&self, v: usize) -> Option<usize> {
        if self.mate[v] == NONE {
            None
        } else {
            Some(self.mate[v] / 2)
        }
    }

    /// Verifies the complementary-slackness conditions on the final duals:
    /// non-negative slack everywhere, zero slack on matched edges, zero dual
    /// on unmatched vertices, and positive-dual blossoms internally matched.
    #[cfg(test)]
    fn assert_complementary_slackness(&self)
    where
        W: std::fmt::Display,
    {
        let n = self.num_vertices;
        let offset = if self.max_cardinality {
            let min = self.dual[..n]
                .iter()
                .fold(W::infinity(), |acc, &d| acc.min(d));
            W::zero().max(-min)
        } else {
            W::zero()
        };
        let eps = W::from(1e-9).unwrap();
        for k in 0..self.num_edges {
            let (i, j) = self.edges[k];
            let wt = self.weights[k];
            let mut s = self.dual[i] + self.dual[j] - (wt + wt);
            // Add the duals of blossoms containing both endpoints.
            let chain = |mut x: usize| {
                let mut out = vec![x];
                while self.blossom_parent[x] != NONE {
                    x = self.blossom_parent[x];
                    out.push(x);
                }
                out.reverse();
                out
            };
            let ci = chain(i);
            let cj = chain(j);
            for (bi, bj) in ci.iter().zip(cj.iter()) {
                if bi != bj {
                    break;
                }
                s = s + self.dual[*bi] + self.dual[*bi];
            }
            assert!(s >= -eps, "edge {} has negative slack {}", k, s);
            if self.mate[i] / 2 == k || self.mate[j] / 2 == k {
                assert!(self.mate[i] / 2 == k && self.mate[j] / 2 == k);
                assert!(s.abs() <= eps, "matched edge {} has slack {}", k, s);
            }
        }
        for v in 0..n {
            assert!(
                self.mate[v] != NONE || (self.dual[v] + offset).abs() <= eps,
                "unmatched vertex {} has dual {}",
                v,
                self.dual[v]
            );
        }
        for b in n..2 * n {
            if self.blossom_base[b] != NONE && self.dual[b] > W::zero() {
                assert!(self.blossom_endpoints[b].len() % 2 == 1);
                for (ix, &p) in self.blossom_endpoints[b].iter().enumerate() {
                    if ix % 2 == 1 {
                        assert!(self.mate[self.endpoint[p]] == p ^ 1);
                        assert!(self.mate[self.endpoint[p ^ 1]] == p);
                    }
                }
            }
        }
    }
}
