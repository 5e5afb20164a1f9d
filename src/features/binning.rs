//! Equal-frequency binning of continuous columns.
//!
//! Edges are sample quantiles at `0, 1/q, .., 1` with linear interpolation
//! between order statistics. Duplicate edges are dropped, so a heavily
//! tied column (most bounce rates are exactly zero) yields fewer than `q`
//! bins instead of an error.
//!
//! Bins are right-closed, `(lo, hi]`, except the first which also holds its
//! lower edge.

use crate::data::Column;
use tracing::warn;

/// Linear-interpolated quantile of already sorted, non-empty `sorted`.
///
/// `p` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let p = p.clamp(0.0, 1.0);
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Sorted non-missing values of `values`.
pub fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));
    present
}

/// Unique quantile edges for `q` bins. Empty when no value is present.
pub fn quantile_edges(values: &[Option<f64>], q: usize) -> Vec<f64> {
    let sorted = sorted_present(values);
    if sorted.is_empty() || q == 0 {
        return Vec::new();
    }
    let mut edges: Vec<f64> = (0..=q)
        .map(|i| quantile_sorted(&sorted, i as f64 / q as f64))
        .collect();
    edges.dedup();
    edges
}

/// Result of binning one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    /// Unique edges; `edges.len() - 1` bins (one bin for a constant column).
    pub edges: Vec<f64>,
    /// Bin index per row, `None` where the input was missing.
    pub codes: Vec<Option<u32>>,
}

impl Bins {
    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        match self.edges.len() {
            0 => 0,
            1 => 1,
            n => n - 1,
        }
    }

    /// Interval labels in bin order.
    ///
    /// Edges are printed with the fewest decimals (at least 4) that keep
    /// every edge distinct, so no two bins share a label.
    pub fn labels(&self) -> Vec<String> {
        let edges = edge_strings(&self.edges);
        match edges.len() {
            0 => Vec::new(),
            1 => vec![format!("[{}, {}]", edges[0], edges[0])],
            _ => edges
                .windows(2)
                .enumerate()
                .map(|(i, w)| {
                    let open = if i == 0 { '[' } else { '(' };
                    format!("{open}{}, {}]", w[0], w[1])
                })
                .collect(),
        }
    }

    /// As a categorical column whose level order is bin order.
    pub fn into_column(self) -> Column {
        let levels = self.labels();
        Column::Categorical {
            codes: self.codes,
            levels,
        }
    }
}

const MIN_EDGE_DECIMALS: usize = 4;
const MAX_EDGE_DECIMALS: usize = 15;

fn edge_strings(edges: &[f64]) -> Vec<String> {
    (MIN_EDGE_DECIMALS..=MAX_EDGE_DECIMALS)
        .map(|decimals| edges.iter().map(|&x| fmt_edge(x, decimals)).collect::<Vec<_>>())
        .find(|labels| labels.windows(2).all(|w| w[0] != w[1]))
        // Shortest round-trip form; distinct edges never collide.
        .unwrap_or_else(|| edges.iter().map(|x| x.to_string()).collect())
}

fn fmt_edge(x: f64, decimals: usize) -> String {
    let s = format!("{x:.decimals$}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Bin `values` into (at most) `q` equal-frequency bins.
pub fn qcut(values: &[Option<f64>], q: usize) -> Bins {
    let edges = quantile_edges(values, q);

    if edges.is_empty() {
        warn!("no values to bin; column stays missing");
        return Bins {
            edges,
            codes: vec![None; values.len()],
        };
    }
    if edges.len() - 1 < q {
        warn!(
            requested = q,
            produced = edges.len().saturating_sub(1).max(1),
            "duplicate quantile edges dropped"
        );
    }

    let last_bin = edges.len().saturating_sub(2);
    let codes = values
        .iter()
        .map(|v| {
            v.map(|x| {
                // first upper edge >= x
                let idx = edges[1..].partition_point(|&e| e < x);
                idx.min(last_bin) as u32
            })
        })
        .collect();

    Bins { edges, codes }
}
