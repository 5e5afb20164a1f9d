//! Linkage trees and flat cuts.
//!
//! # Module Overview
//!
//! ## [`LinkageTree`] - Agglomerative Merge History
//!
//! Records the complete merge history of hierarchical clustering:
//!
//! ```text
//!         8 (height=0.9)
//!        / \
//!       4   7 (height=0.5)
//!          / \
//!         5   6 (height=0.1, 0.2)
//!        / \ / \
//!       0  1 2  3 (leaves)
//! ```
//!
//! Key property: "cut" it to get any number of groups.
//!
//! ## Cuts
//!
//! | Cut | Keeps | Result |
//! |-----|-------|--------|
//! | [`LinkageTree::cut_to_k`] | first `n - k` merges | exactly `k` groups |
//! | [`LinkageTree::cut_at_distance`] | subtrees with height ≤ t | as many groups as the height gives |
//!
//! Both label groups `1..=k` in dendrogram (left-first) order.
//!
//! ## [`validate_linkage`] - Structural Checks
//!
//! Cuts assume a well-formed tree; [`HealthCheck`] reports anything that
//! would make them panic or mislabel.

mod assignment;
mod linkage_tree;
mod validate;

pub use assignment::ClusterAssignment;
pub use linkage_tree::{LinkageTree, Merge};
pub use validate::{
    validate_linkage, HealthCheck, HealthReport, LinkageIssue, LinkageReport, Severity,
};
