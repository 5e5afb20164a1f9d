//! Agglomerative clustering of browsing sessions.
//!
//! ## Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each session as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! **linkage tree**, a binary tree you can cut to get k clusters.
//!
//! **Linkage methods** determine "distance between clusters":
//!
//! | Linkage | Distance | Effect |
//! |---------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact clusters |
//! | Average | mean(pairwise) | Balanced compromise |
//! | Ward | Variance increase | Minimizes within-cluster variance |
//!
//! ## Usage
//!
//! ```rust
//! use shopclust::cluster::{HierarchicalClustering, Linkage};
//! use shopclust::distance::gower_matrix;
//! use ndarray::array;
//!
//! let data = array![
//!     [0.0, 0.0],
//!     [0.1, 0.0],
//!     [9.9, 1.0],
//!     [10.0, 1.0],
//! ];
//! // second column is a category code
//! let d = gower_matrix(data.view(), &[false, true]).unwrap();
//!
//! let tree = HierarchicalClustering::new()
//!     .with_linkage(Linkage::Complete)
//!     .fit_tree(&d)
//!     .unwrap();
//! let labels = tree.cut_to_k(2).unwrap();
//! assert_eq!(labels.label(0), labels.label(1));
//! assert_ne!(labels.label(0), labels.label(2));
//! ```

mod hierarchical;

pub use hierarchical::{HierarchicalClustering, Linkage};
