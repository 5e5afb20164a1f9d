//! Linkage tree validation and health checking utilities.
//!
//! Verifies the structural invariants every cut relies on:
//! - a complete tree has exactly `n - 1` merges
//! - every merge references nodes that already exist
//! - every node except the root is merged exactly once
//! - recorded sizes add up
//! - distances are finite, non-negative and (for monotone linkages)
//!   non-decreasing
//!
//! # Example
//!
//! ```rust
//! use shopclust::hierarchy::{HealthCheck, LinkageTree};
//!
//! let mut tree = LinkageTree::new(3);
//! tree.add_merge(0, 1, 0.2, 2);
//! tree.add_merge(2, 3, 0.4, 3);
//!
//! let report = tree.health_check();
//! assert!(report.is_healthy(), "{}", report);
//! ```

use std::fmt;

use thiserror::Error;

use super::LinkageTree;

/// How much a [`LinkageIssue`] matters to a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Cuts still work; heights may read oddly.
    Warning,
    /// Cuts may panic or mislabel.
    Error,
}

/// One broken invariant of a [`LinkageTree`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkageIssue {
    #[error("tree has no items")]
    NoItems,
    #[error("incomplete merge sequence: expected {expected} merges, found {found}")]
    Incomplete { expected: usize, found: usize },
    #[error("merge {merge} references node {child} before it exists")]
    ForwardReference { merge: usize, child: usize },
    #[error("merge {merge} reuses node {node}, already merged")]
    MergedTwice { merge: usize, node: usize },
    #[error("merge {merge} joins a node with itself")]
    SelfMerge { merge: usize },
    #[error("merge {merge} records size {recorded}, children sum to {expected}")]
    SizeMismatch {
        merge: usize,
        recorded: usize,
        expected: usize,
    },
    #[error("merge {merge} has distance {distance}")]
    BadDistance { merge: usize, distance: f64 },
    /// Only valid for centroid-style linkages.
    #[error("merge {merge} at {distance} is below an earlier {previous}")]
    DistanceDecreases {
        merge: usize,
        distance: f64,
        previous: f64,
    },
    #[error("{count} nodes never merged, first: {first:?}")]
    NeverMerged { count: usize, first: Vec<usize> },
}

impl LinkageIssue {
    pub fn severity(&self) -> Severity {
        match self {
            LinkageIssue::DistanceDecreases { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Merge index the issue points at, if any.
    pub fn merge(&self) -> Option<usize> {
        match *self {
            LinkageIssue::ForwardReference { merge, .. }
            | LinkageIssue::MergedTwice { merge, .. }
            | LinkageIssue::SelfMerge { merge }
            | LinkageIssue::SizeMismatch { merge, .. }
            | LinkageIssue::BadDistance { merge, .. }
            | LinkageIssue::DistanceDecreases { merge, .. } => Some(merge),
            _ => None,
        }
    }
}

/// Everything [`validate_linkage`] found, in merge order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkageReport {
    pub issues: Vec<LinkageIssue>,
}

impl LinkageReport {
    /// No error-level issue.
    pub fn is_healthy(&self) -> bool {
        self.issues.iter().all(|i| i.severity() < Severity::Error)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity() == severity).count()
    }
}

impl fmt::Display for LinkageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "linkage ok");
        }
        writeln!(
            f,
            "{} errors, {} warnings",
            self.count(Severity::Error),
            self.count(Severity::Warning)
        )?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// Health report with additional statistics.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub validation: LinkageReport,
    pub n_items: usize,
    pub n_merges: usize,
    /// Largest merge distance.
    pub height: f64,
    /// Longest root-to-leaf path, in merges.
    pub max_depth: usize,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.validation.is_healthy()
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} leaves, {} merges, height {:.4}, depth {}",
            self.n_items, self.n_merges, self.height, self.max_depth
        )?;
        write!(f, "{}", self.validation)
    }
}

/// Trait for types that can be health-checked.
pub trait HealthCheck {
    /// Perform a health check and return a report.
    fn health_check(&self) -> HealthReport;

    /// Quick check: returns true if healthy.
    fn is_healthy(&self) -> bool {
        self.health_check().is_healthy()
    }
}

impl HealthCheck for LinkageTree {
    fn health_check(&self) -> HealthReport {
        let validation = validate_linkage(self);
        let n = self.n_items();

        // Depth is only meaningful when every reference points backwards.
        let mut depth = vec![0usize; self.n_merges()];
        let mut max_depth = 0;
        if validation.is_healthy() {
            for (m, merge) in self.merges().enumerate() {
                let left = if merge.left < n { 0 } else { depth[merge.left - n] };
                let right = if merge.right < n { 0 } else { depth[merge.right - n] };
                let here = 1 + left.max(right);
                depth[m] = here;
                max_depth = max_depth.max(here);
            }
        }

        HealthReport {
            validation,
            n_items: n,
            n_merges: self.n_merges(),
            height: self.merges().map(|m| m.distance).fold(0.0, f64::max),
            max_depth,
        }
    }
}

/// Validate the structure of a linkage tree.
///
/// Non-monotone distances are only a warning: valid for centroid-style
/// linkages, suspicious for complete.
pub fn validate_linkage(tree: &LinkageTree) -> LinkageReport {
    let mut issues = Vec::new();
    let n = tree.n_items();

    if n == 0 {
        issues.push(LinkageIssue::NoItems);
        return LinkageReport { issues };
    }
    if tree.n_merges() != n - 1 {
        issues.push(LinkageIssue::Incomplete {
            expected: n - 1,
            found: tree.n_merges(),
        });
    }

    let total_nodes = n + tree.n_merges();
    let mut used = vec![false; total_nodes];
    let mut sizes: Vec<usize> = vec![1; total_nodes];
    let mut previous = f64::NEG_INFINITY;

    for (m, merge) in tree.merges().enumerate() {
        let node = n + m;

        let mut children_ok = true;
        for child in [merge.left, merge.right] {
            if child >= node {
                issues.push(LinkageIssue::ForwardReference { merge: m, child });
                children_ok = false;
            } else if used[child] {
                issues.push(LinkageIssue::MergedTwice { merge: m, node: child });
            } else {
                used[child] = true;
            }
        }
        if merge.left == merge.right {
            issues.push(LinkageIssue::SelfMerge { merge: m });
        }

        if children_ok {
            let expected = sizes[merge.left] + sizes[merge.right];
            if merge.size != expected {
                issues.push(LinkageIssue::SizeMismatch {
                    merge: m,
                    recorded: merge.size,
                    expected,
                });
            }
            sizes[node] = expected;
        }

        if !merge.distance.is_finite() || merge.distance < 0.0 {
            issues.push(LinkageIssue::BadDistance {
                merge: m,
                distance: merge.distance,
            });
        } else if merge.distance < previous {
            issues.push(LinkageIssue::DistanceDecreases {
                merge: m,
                distance: merge.distance,
                previous,
            });
        }
        previous = previous.max(merge.distance);
    }

    if tree.is_complete() {
        let unmerged: Vec<usize> = (0..total_nodes - 1).filter(|&id| !used[id]).collect();
        if !unmerged.is_empty() {
            issues.push(LinkageIssue::NeverMerged {
                count: unmerged.len(),
                first: unmerged.into_iter().take(5).collect(),
            });
        }
    }

    LinkageReport { issues }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_tree_is_clean() {
        let mut tree = LinkageTree::new(4);
        tree.add_merge(0, 1, 0.1, 2);
        tree.add_merge(2, 3, 0.2, 2);
        tree.add_merge(4, 5, 0.3, 4);

        let report = tree.health_check();
        assert!(report.validation.is_clean(), "{}", report);
        assert_eq!(report.max_depth, 2);
        assert_eq!(report.height, 0.3);
    }

    #[test]
    fn test_forward_reference_is_an_error() {
        let mut tree = LinkageTree::new(3);
        tree.add_merge(0, 4, 0.1, 2);
        tree.add_merge(1, 2, 0.2, 2);

        let report = validate_linkage(&tree);
        assert!(!report.is_healthy());
        assert!(report
            .issues
            .contains(&LinkageIssue::ForwardReference { merge: 0, child: 4 }));
        assert_eq!(report.issues[0].merge(), Some(0));
    }

    #[test]
    fn test_double_use_and_bad_size() {
        let mut tree = LinkageTree::new(3);
        tree.add_merge(0, 1, 0.1, 2);
        tree.add_merge(0, 3, 0.2, 5);

        let report = validate_linkage(&tree);
        assert!(report
            .issues
            .contains(&LinkageIssue::MergedTwice { merge: 1, node: 0 }));
        assert!(report.issues.contains(&LinkageIssue::SizeMismatch {
            merge: 1,
            recorded: 5,
            expected: 3
        }));
    }

    #[test]
    fn test_non_monotone_is_warning() {
        let mut tree = LinkageTree::new(3);
        tree.add_merge(0, 1, 0.5, 2);
        tree.add_merge(2, 3, 0.2, 3);

        let report = validate_linkage(&tree);
        assert!(report.is_healthy());
        assert_eq!(report.count(Severity::Warning), 1);
        assert_eq!(report.count(Severity::Error), 0);
        let line = report.to_string();
        assert!(line.contains("0 errors, 1 warnings"), "{line}");
        assert!(line.contains("merge 1 at 0.2"), "{line}");
    }

    #[test]
    fn test_incomplete_tree() {
        let mut tree = LinkageTree::new(3);
        tree.add_merge(0, 1, 0.1, 2);
        let report = validate_linkage(&tree);
        assert!(!report.is_healthy());
        assert_eq!(
            report.issues,
            vec![LinkageIssue::Incomplete {
                expected: 2,
                found: 1
            }]
        );
    }

    proptest! {
        // A caterpillar tree (each leaf joins the running cluster) is always valid.
        #[test]
        fn caterpillar_trees_are_healthy(n in 1usize..60, step in 0.0f64..1.0) {
            let mut tree = LinkageTree::new(n);
            let mut current = 0;
            for leaf in 1..n {
                tree.add_merge(current, leaf, step * leaf as f64, leaf + 1);
                current = n + leaf - 1;
            }
            let report = tree.health_check();
            prop_assert!(report.validation.is_clean(), "{}", report);
            prop_assert_eq!(report.max_depth, n - 1);
        }
    }
}
