/// An incrementally built forest answering lowest-common-ancestor queries.
///
/// The weighted blossom engine keeps one node per even blossom of the
/// current alternating forest. When a tight edge connects two even vertices,
/// the LCA of their blossom nodes is the blossom that will become the base
/// of the contraction; if the nodes lie in different trees there is no
/// common ancestor and the edge closes an augmenting path instead.
///
/// Nodes are added one leaf at a time and never removed; the structure is
/// rebuilt from scratch for every search stage. Queries and insertions use
/// binary lifting and cost O(log n); the jump tables are filled as leaves
/// arrive, so no global preprocessing pass is needed.
pub struct LcaForest {
    depth: Vec<u32>,
    root: Vec<NodeId>,
    // up[v][k] is the 2^k-th ancestor of v.
    up: Vec<Vec<NodeId>>,
}

/// Handle to a node in an [`LcaForest`].
pub type NodeId = usize;

impl LcaForest {
    pub fn new() -> Self {
        LcaForest {
            depth: Vec::new(),
            root: Vec::new(),
            up: Vec::new(),
        }
    }

    /// Number of nodes added so far.
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Discards all nodes.
    pub fn clear(&mut self) {
        self.depth.clear();
        self.root.clear();
        self.up.clear();
    }

    /// Adds a new tree root and returns its handle.
    pub fn add_root(&mut self) -> NodeId {
        let v = self.depth.len();
        self.depth.push(0);
        self.root.push(v);
        self.up.push(Vec::new());
        v
    }

    /// Adds a leaf below `parent` and returns its handle.
    ///
    /// # Panics
    /// Panics if `parent` is not a handle returned by this forest.
    pub fn add_leaf(&mut self, parent: NodeId) -> NodeId {
        assert!(parent < self.depth.len(), "invalid parent node");
        let v = self.depth.len();
        self.depth.push(self.depth[parent] + 1);
        self.root.push(self.root[parent]);
        let mut jumps = vec![parent];
        let mut k = 0;
        // up[v][k+1] = up[ up[v][k] ][k]
        while let Some(&next) = self.up[jumps[k]].get(k) {
            jumps.push(next);
            k += 1;
        }
        self.up.push(jumps);
        v
    }

    /// Ancestor of `v` that is `steps` levels up, or the root if `steps`
    /// exceeds the depth of `v`.
    fn ancestor(&self, mut v: NodeId, mut steps: u32) -> NodeId {
        let mut k = 0;
        while steps != 0 {
            if steps & 1 != 0 {
                v = self.up[v][k];
            }
            steps >>= 1;
            k += 1;
        }
        v
    }

    /// Lowest common ancestor of `a` and `b`, or `None` if they belong to
    /// different trees.
    pub fn lowest_common_ancestor(&self, mut a: NodeId, mut b: NodeId) -> Option<NodeId> {
        if self.root[a] != self.root[b] {
            return None;
        }
        if self.depth[a] < self.depth[b] {
            std::mem::swap(&mut a, &mut b);
        }
        a = self.ancestor(a, self.depth[a] - self.depth[b]);
        if a == b {
            return Some(a);
        }
        // Descend both sides together from the highest jump size.
        let mut k = self.up[a].len();
        while k > 0 {
            k -= 1;
            match (self.up[a].get(k), self.up[b].get(k)) {
                (Some(&ua), Some(&ub)) if ua != ub => {
                    a = ua;
                    b = ub;
                }
                _ => {}
            }
        }
        Some(self.up[a][0])
    }
}

impl Default for LcaForest {
    fn default() -> Self {
        LcaForest::new()
    }
}
