//! Linkage tree (dendrogram) produced by agglomerative clustering.
//!
//! Node ids follow the SciPy/MATLAB convention:
//! - leaves: `0..n`
//! - merge `m` creates node `n + m`
//!
//! A complete tree over `n` items has `n - 1` merges and its root is node
//! `2n - 2` (or leaf `0` when `n = 1`).

use super::assignment::ClusterAssignment;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single merge record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// First child node id.
    pub left: usize,
    /// Second child node id.
    pub right: usize,
    /// Linkage distance at which the children merged.
    pub distance: f64,
    /// Number of leaves under the new node.
    pub size: usize,
}

/// Merge history of an agglomerative clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkageTree {
    merges: Vec<Merge>,
    n_items: usize,
}

impl LinkageTree {
    /// Create an empty tree for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, left: usize, right: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            left,
            right,
            distance,
            size,
        });
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges, in merge order.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Merge `m`, if recorded.
    pub fn merge(&self, m: usize) -> Option<&Merge> {
        self.merges.get(m)
    }

    /// The merge distances, in merge order.
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }

    /// Whether merge distances never decrease.
    pub fn is_monotone(&self) -> bool {
        self.merges.windows(2).all(|w| w[0].distance <= w[1].distance)
    }

    /// Whether the tree has all `n - 1` merges.
    pub fn is_complete(&self) -> bool {
        self.n_items > 0 && self.merges.len() == self.n_items - 1
    }

    fn ensure_complete(&self) -> Result<()> {
        if self.n_items == 0 {
            return Err(Error::EmptyInput);
        }
        if !self.is_complete() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} merges", self.n_items - 1),
                actual: format!("{} merges", self.merges.len()),
            });
        }
        Ok(())
    }

    fn root(&self) -> usize {
        if self.merges.is_empty() {
            0
        } else {
            self.n_items + self.merges.len() - 1
        }
    }

    /// Leaves under `node`, left subtree first.
    pub fn leaves_under(&self, node: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if id < self.n_items {
                leaves.push(id);
            } else if let Some(m) = self.merges.get(id - self.n_items) {
                stack.push(m.right);
                stack.push(m.left);
            }
        }
        leaves
    }

    /// Leaves in dendrogram order (left-first from the root).
    pub fn leaf_order(&self) -> Vec<usize> {
        if self.n_items == 0 {
            return Vec::new();
        }
        self.leaves_under(self.root())
    }

    /// Cluster Assigner: exactly `k` groups.
    ///
    /// Keeps the first `n - k` merges, i.e. stops the agglomeration `k - 1`
    /// steps before completion. Labels run `1..=k` in dendrogram order: the
    /// group holding the leftmost leaf is `1`.
    ///
    /// Fails with [`Error::InvalidClusterCount`] when `k < 1` or `k > n`.
    pub fn cut_to_k(&self, k: usize) -> Result<ClusterAssignment> {
        if k == 0 || k > self.n_items {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }
        self.ensure_complete()?;

        let kept = self.n_items - k;
        Ok(self.assign(|m| m < kept))
    }

    /// Flat clusters at height `threshold`.
    ///
    /// A subtree stays whole when its highest merge is at or below
    /// `threshold`; this holds for non-monotone trees too.
    pub fn cut_at_distance(&self, threshold: f64) -> Result<ClusterAssignment> {
        self.ensure_complete()?;

        let n = self.n_items;
        let mut height = vec![0.0_f64; self.merges.len()];
        for (m, merge) in self.merges.iter().enumerate() {
            let left = if merge.left < n { 0.0 } else { height[merge.left - n] };
            let right = if merge.right < n { 0.0 } else { height[merge.right - n] };
            height[m] = merge.distance.max(left).max(right);
        }
        Ok(self.assign(|m| height[m] <= threshold))
    }

    /// Walk from the root; every node whose subtree is `inside` a flat
    /// cluster (leaves always are) becomes the next label.
    fn assign<F: Fn(usize) -> bool>(&self, inside: F) -> ClusterAssignment {
        let n = self.n_items;
        let mut labels = vec![0; n];
        let mut next = 0;
        let mut stack = vec![self.root()];

        while let Some(node) = stack.pop() {
            if node < n || inside(node - n) {
                next += 1;
                for leaf in self.leaves_under(node) {
                    labels[leaf] = next;
                }
            } else {
                let m = &self.merges[node - n];
                stack.push(m.right);
                stack.push(m.left);
            }
        }

        ClusterAssignment::new(next, labels)
    }
}
