//! Contingency tables and agreement scores.
//!
//! Groups found by the linkage cut are unsupervised; the report compares
//! them against observed session attributes (visitor type, special-day
//! proximity, whether the session ended in a purchase).
//!
//! # Overview
//!
//! | Item | Range | Best | Notes |
//! |------|-------|------|-------|
//! | [`Crosstab`] | counts | - | Row keys × group labels |
//! | [`nmi`] | [0, 1] | 1 | Normalized, label-permutation invariant |
//! | [`ari`] | [-1, 1] | 1 | Adjusted for chance |
//! | [`purity`] | [0, 1] | 1 | Simple, biased toward many clusters |
//!
//! # Example
//!
//! ```rust
//! use shopclust::metrics::{nmi, purity};
//!
//! let groups = [1, 1, 2, 2, 3, 3];
//! let revenue = [0, 0, 0, 1, 1, 1];
//!
//! assert!(nmi(&groups, &revenue) < 1.0);
//! assert!((purity(&groups, &revenue) - 5.0 / 6.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)

use crate::data::compare_labels;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Counts of (row key, group label) pairs.
///
/// Row keys are tuples of labels so that multi-column rows such as
/// `(VisitorType, Revenue)` fit the same table. Rows sort with numbers
/// before text, element by element; group labels sort ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crosstab {
    row_keys: Vec<Vec<String>>,
    col_keys: Vec<usize>,
    counts: Vec<Vec<usize>>,
}

impl Crosstab {
    /// Tabulate `(row key, group)` observations.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Vec<String>, usize)>,
    {
        let mut cells: HashMap<(Vec<String>, usize), usize> = HashMap::new();
        for pair in pairs {
            *cells.entry(pair).or_insert(0) += 1;
        }

        let mut row_keys: Vec<Vec<String>> = cells.keys().map(|(r, _)| r.clone()).collect();
        row_keys.sort_by(|a, b| compare_keys(a, b));
        row_keys.dedup();

        let mut col_keys: Vec<usize> = cells.keys().map(|&(_, c)| c).collect();
        col_keys.sort_unstable();
        col_keys.dedup();

        let counts = row_keys
            .iter()
            .map(|r| {
                col_keys
                    .iter()
                    .map(|&c| cells.get(&(r.clone(), c)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Self {
            row_keys,
            col_keys,
            counts,
        }
    }

    /// Row key tuples, sorted with numbers before text.
    pub fn row_keys(&self) -> &[Vec<String>] {
        &self.row_keys
    }

    /// Group labels, ascending.
    pub fn col_keys(&self) -> &[usize] {
        &self.col_keys
    }

    /// Count at `(row, col)` by position.
    pub fn count(&self, row: usize, col: usize) -> usize {
        self.counts[row][col]
    }

    /// Count for a row key and group label, zero if absent.
    pub fn get(&self, key: &[&str], group: usize) -> usize {
        let row = self
            .row_keys
            .iter()
            .position(|r| r.len() == key.len() && r.iter().zip(key).all(|(a, b)| a == b));
        let col = self.col_keys.iter().position(|&c| c == group);
        match (row, col) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    /// Sum across every group for the row at position `row`.
    pub fn row_total(&self, row: usize) -> usize {
        self.counts[row].iter().sum()
    }

    /// Per-group sums, aligned with [`Crosstab::col_keys`].
    pub fn col_totals(&self) -> Vec<usize> {
        (0..self.col_keys.len())
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .collect()
    }

    /// Number of pairs counted.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// True when no pair was counted.
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty()
    }
}

fn compare_keys(a: &[String], b: &[String]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match compare_labels(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Normalized Mutual Information between two labelings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Returns 0 for empty or length-mismatched input and 1 when both
/// labelings are constant.
///
/// ```rust
/// use shopclust::metrics::nmi;
///
/// // same partition, different names
/// assert!((nmi(&[1, 1, 2, 2], &[0, 0, 1, 1]) - 1.0).abs() < 1e-12);
/// ```
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n = pred.len() as f64;
    let joint = build_contingency_table(pred, truth);
    let p_pred = marginal(pred);
    let p_truth = marginal(truth);

    let h_pred = entropy(p_pred.values().copied(), n);
    let h_truth = entropy(p_truth.values().copied(), n);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n;
        let p_p = p_pred[&p] as f64 / n;
        let p_t = p_truth[&t] as f64 / n;
        mi += p_joint * (p_joint / (p_p * p_t)).ln();
    }

    let denom = h_pred + h_truth;
    if denom > 0.0 {
        (2.0 * mi / denom).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Adjusted Rand Index between two labelings.
///
/// 0 for chance-level agreement, 1 for identical partitions.
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n = pred.len();
    let joint = build_contingency_table(pred, truth);

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = marginal(pred).values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = marginal(truth).values().map(|&b| comb2(b) as f64).sum();
    let comb_n = comb2(n) as f64;
    if comb_n == 0.0 {
        return 1.0;
    }

    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0;
    }

    (sum_comb_ij - expected) / denom
}

/// Purity of `pred` with respect to `truth`.
///
/// For each predicted group take its most common true label; purity is
/// the fraction of rows that match it. Reaches 1.0 when every row is its
/// own group.
pub fn purity(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let joint = build_contingency_table(pred, truth);

    let mut cluster_maxes: HashMap<usize, usize> = HashMap::new();
    for (&(p, _), &count) in &joint {
        let current_max = cluster_maxes.entry(p).or_insert(0);
        *current_max = (*current_max).max(count);
    }

    let correct: usize = cluster_maxes.values().sum();
    correct as f64 / pred.len() as f64
}

fn build_contingency_table(pred: &[usize], truth: &[usize]) -> HashMap<(usize, usize), usize> {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    table
}

fn marginal(labels: &[usize]) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    for &l in labels {
        *counts.entry(l).or_insert(0) += 1;
    }
    counts
}

fn entropy(counts: impl Iterator<Item = usize>, n: f64) -> f64 {
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum()
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_crosstab_counts() {
        let pairs = vec![
            (key(&["Returning_Visitor"]), 1),
            (key(&["Returning_Visitor"]), 1),
            (key(&["New_Visitor"]), 2),
            (key(&["Returning_Visitor"]), 2),
            (key(&["Other"]), 3),
        ];
        let ct = Crosstab::from_pairs(pairs);

        assert_eq!(ct.col_keys(), &[1, 2, 3]);
        assert_eq!(
            ct.row_keys(),
            &[key(&["New_Visitor"]), key(&["Other"]), key(&["Returning_Visitor"])]
        );
        assert_eq!(ct.get(&["Returning_Visitor"], 1), 2);
        assert_eq!(ct.get(&["New_Visitor"], 1), 0);
        assert_eq!(ct.get(&["Missing"], 1), 0);
        assert_eq!(ct.row_total(2), 3);
        assert_eq!(ct.col_totals(), vec![2, 2, 1]);
        assert_eq!(ct.total(), 5);
    }

    #[test]
    fn test_crosstab_numeric_rows_sort_by_value() {
        let pairs = vec![(key(&["0.8"]), 1), (key(&["0"]), 1), (key(&["0.2"]), 2)];
        let ct = Crosstab::from_pairs(pairs);
        assert_eq!(ct.row_keys(), &[key(&["0"]), key(&["0.2"]), key(&["0.8"])]);
    }

    #[test]
    fn test_crosstab_composite_keys() {
        let pairs = vec![
            (key(&["Returning_Visitor", "TRUE"]), 1),
            (key(&["Returning_Visitor", "FALSE"]), 1),
            (key(&["New_Visitor", "TRUE"]), 1),
        ];
        let ct = Crosstab::from_pairs(pairs);
        assert_eq!(ct.row_keys()[0], key(&["New_Visitor", "TRUE"]));
        assert_eq!(ct.row_keys()[1], key(&["Returning_Visitor", "FALSE"]));
        assert_eq!(ct.get(&["Returning_Visitor", "TRUE"], 1), 1);
    }

    #[test]
    fn test_empty_crosstab() {
        let ct = Crosstab::from_pairs(Vec::new());
        assert!(ct.is_empty());
        assert_eq!(ct.total(), 0);
    }

    #[test]
    fn test_nmi_perfect() {
        let pred = [0, 0, 1, 1, 2, 2];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_nmi_permuted() {
        let pred = [1, 1, 0, 0, 2, 2];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_nmi_independent_is_zero() {
        let pred = [1, 1, 2, 2];
        let truth = [0, 1, 0, 1];
        assert!(nmi(&pred, &truth).abs() < 1e-12);
    }

    #[test]
    fn test_nmi_bounds() {
        let pred = [1, 2, 3, 1, 2, 3, 1, 1];
        let truth = [0, 0, 1, 1, 0, 1, 1, 0];
        let score = nmi(&pred, &truth);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_nmi_mismatched_lengths() {
        assert_eq!(nmi(&[1, 2], &[0]), 0.0);
        assert_eq!(nmi(&[], &[]), 0.0);
    }

    #[test]
    fn test_ari_perfect() {
        let pred = [0, 0, 1, 1];
        let truth = [0, 0, 1, 1];
        assert!((ari(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_purity_perfect() {
        let pred = [0, 0, 1, 1];
        let truth = [0, 0, 1, 1];
        assert!((purity(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_purity_overclustering() {
        let pred = [0, 1, 2, 3];
        let truth = [0, 0, 1, 1];
        assert!((purity(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_purity_single_group_is_majority_share() {
        let pred = [1, 1, 1, 1];
        let truth = [0, 0, 0, 1];
        assert!((purity(&pred, &truth) - 0.75).abs() < 1e-12);
    }
}
