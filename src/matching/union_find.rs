/// Disjoint-set (union-find) over a fixed universe `0..n`.
///
/// The cardinality matching engine groups the vertices of each contracted
/// blossom into one set whose representative is the blossom base, so the
/// representative of a union must be controllable; `union_into` provides
/// that.
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    /// Initializes a union-find for `n` elements (0..n-1).
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    /// Finds the representative (root) of the set containing `x`.
    /// Uses path compression.
    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    /// Merges the set containing `x` into the set containing `r`, making
    /// `find(r)` the representative of both.
    pub fn union_into(&mut self, x: usize, r: usize) {
        let rx = self.find(x);
        let rr = self.find(r);
        if rx != rr {
            self.parent[rx] = rr;
        }
    }

    /// Resets every element to its own singleton set.
    pub fn reset(&mut self) {
        for (i, p) in self.parent.iter_mut().enumerate() {
            *p = i;
        }
    }
}
