//! Flat cluster labels produced by cutting a linkage tree.

use serde::{Deserialize, Serialize};

/// One group label in `1..=k` per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    k: usize,
    labels: Vec<usize>,
}

impl ClusterAssignment {
    /// Wrap labels; `k` is the number of distinct labels.
    pub(crate) fn new(k: usize, labels: Vec<usize>) -> Self {
        debug_assert!(labels.iter().all(|&l| (1..=k).contains(&l)));
        Self { k, labels }
    }

    /// Number of groups.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Labels, indexed by item.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Label of item `i`.
    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when there are no items.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Group sizes; entry `g - 1` is the size of group `g`.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &l in &self.labels {
            sizes[l - 1] += 1;
        }
        sizes
    }

    /// Items in group `label`, ascending.
    pub fn members(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }
}
