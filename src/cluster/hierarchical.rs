//! Hierarchical (agglomerative) clustering over a precomputed
//! dissimilarity matrix.
//!
//! Bottom-up clustering that builds a **linkage tree** by iteratively
//! merging the closest clusters. You don't need to pick k up front:
//! cut the tree for any k afterwards.
//!
//! # Linkage Methods
//!
//! The key choice: how do we define "distance between clusters"?
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact clusters, bounded diameter |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance |
//!
//! ## Complete Linkage on Gower Distances
//!
//! Complete linkage only ever compares dissimilarities, so it works on any
//! precomputed matrix, including Gower's mix of range-scaled numbers and
//! label mismatches. The merge height of a group is its diameter: every
//! pair of sessions in a group cut at height h is at most h apart.
//!
//! Ward assumes Euclidean geometry; it runs on Gower input but the heights
//! lose their variance interpretation.
//!
//! # Determinism
//!
//! Merges come from kodama's nearest-neighbor chain, stably sorted by
//! distance. Equal inputs give bit-identical trees; among equal-distance
//! candidates the order is fixed by that procedure.

use crate::distance::DissimilarityMatrix;
use crate::error::{Error, Result};
use crate::hierarchy::LinkageTree;
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    #[default]
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    Ward,
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Ward => "ward",
        };
        write!(f, "{name}")
    }
}

/// Hierarchical (agglomerative) clustering.
///
/// Builds the whole tree; the number of groups is chosen later with
/// [`LinkageTree::cut_to_k`].
#[derive(Debug, Clone, Default)]
pub struct HierarchicalClustering {
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer (complete linkage).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Linkage method in use.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Linkage Builder: fit and return the full tree.
    pub fn fit_tree(&self, dissimilarities: &DissimilarityMatrix) -> Result<LinkageTree> {
        let n = dissimilarities.n();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if n == 1 {
            return Ok(LinkageTree::new(1));
        }

        let method = match self.linkage {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        };

        // kodama rewrites the condensed buffer in place; work on a copy so
        // the matrix stays usable.
        let mut condensed = dissimilarities.condensed().to_vec();

        // kodama's dendrogram uses SciPy/MATLAB-style cluster labels:
        // - leaves: 0..n-1
        // - each merge i creates cluster id n+i
        let dend = kodama_linkage(&mut condensed, n, method);

        let mut tree = LinkageTree::new(n);
        for step in dend.steps() {
            tree.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
        }

        if !tree.is_monotone() {
            warn!(linkage = %self.linkage, "linkage tree has decreasing merge distances");
        }
        info!(
            items = n,
            merges = tree.n_merges(),
            linkage = %self.linkage,
            height = tree.distances().last().copied().unwrap_or(0.0),
            "built linkage tree"
        );

        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::gower_matrix;
    use ndarray::array;

    fn scenario() -> DissimilarityMatrix {
        let data = array![
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [5.0, 5.0, 0.0],
            [5.0, 5.0, 1.0],
        ];
        gower_matrix(data.view(), &[false, false, true]).unwrap()
    }

    #[test]
    fn test_hierarchical_basic() {
        let d = scenario();
        let tree = HierarchicalClustering::new().fit_tree(&d).unwrap();
        let labels = tree.cut_to_k(2).unwrap();
        let l = labels.labels();

        assert_eq!(l[0], l[1]);
        assert_eq!(l[1], l[2]);
        assert_eq!(l[2], l[3]);
        assert_eq!(l[4], l[5]);
        assert_ne!(l[0], l[4]);
    }

    #[test]
    fn test_identical_rows_merge_first() {
        let tree = HierarchicalClustering::new().fit_tree(&scenario()).unwrap();
        let merges: Vec<_> = tree.merges().collect();

        let first_two: Vec<(usize, usize)> = merges[..2]
            .iter()
            .map(|m| (m.left.min(m.right), m.left.max(m.right)))
            .collect();
        assert!(first_two.contains(&(0, 1)));
        assert!(first_two.contains(&(2, 3)));
        assert_eq!(merges[0].distance, 0.0);
        assert_eq!(merges[1].distance, 0.0);
    }

    #[test]
    fn test_tree_shape() {
        let d = scenario();
        let tree = HierarchicalClustering::new().fit_tree(&d).unwrap();

        assert_eq!(tree.n_items(), 6);
        assert_eq!(tree.n_merges(), 5);
        assert!(tree.is_monotone());
        assert_eq!(tree.merges().last().unwrap().size, 6);
    }

    #[test]
    fn test_complete_linkage_height_is_diameter() {
        let d = scenario();
        let tree = HierarchicalClustering::new().fit_tree(&d).unwrap();
        let max = d.condensed().iter().copied().fold(0.0, f64::max);
        assert_eq!(tree.distances().last().copied(), Some(max));
    }

    #[test]
    fn test_invalid_k() {
        let d = scenario();
        let tree = HierarchicalClustering::new().fit_tree(&d).unwrap();
        for k in [0, 7] {
            let err = tree.cut_to_k(k).unwrap_err();
            assert!(matches!(err, Error::InvalidClusterCount { .. }));
        }
    }

    #[test]
    fn test_other_linkages_run() {
        let d = scenario();
        for linkage in [Linkage::Single, Linkage::Average, Linkage::Ward] {
            let tree = HierarchicalClustering::new()
                .with_linkage(linkage)
                .fit_tree(&d)
                .unwrap();
            assert_eq!(tree.n_merges(), 5);
        }
    }

    #[test]
    fn test_defaults_to_complete_linkage() {
        let clusterer = HierarchicalClustering::new();
        assert_eq!(clusterer.linkage(), Linkage::Complete);
        let explicit = clusterer.clone().with_linkage(Linkage::Complete);
        let d = scenario();
        assert_eq!(clusterer.fit_tree(&d).unwrap(), explicit.fit_tree(&d).unwrap());
    }

    #[test]
    fn test_single_item() {
        let d = DissimilarityMatrix::from_condensed(1, vec![]).unwrap();
        let tree = HierarchicalClustering::new().fit_tree(&d).unwrap();
        assert_eq!(tree.n_merges(), 0);
        assert_eq!(tree.cut_to_k(1).unwrap().labels(), &[1]);
    }
}
