//! Symmetric dissimilarity matrix in condensed storage.

use crate::error::{Error, Result};
use ndarray::Array2;

/// Position of `(i, j)`, `i < j`, in the condensed vector of an `n`-item
/// matrix (row-major strict upper triangle).
#[inline]
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Length of the condensed vector for `n` items.
#[inline]
pub fn condensed_len(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// A square, symmetric, zero-diagonal dissimilarity matrix.
///
/// Only the strict upper triangle is stored (`n(n-1)/2` values), which
/// halves the O(n²) footprint; [`DissimilarityMatrix::get`] and
/// [`DissimilarityMatrix::to_square`] present the full square view.
#[derive(Debug, Clone, PartialEq)]
pub struct DissimilarityMatrix {
    n: usize,
    condensed: Vec<f64>,
}

impl DissimilarityMatrix {
    /// Wrap a condensed vector for `n` items.
    pub fn from_condensed(n: usize, condensed: Vec<f64>) -> Result<Self> {
        if condensed.len() != condensed_len(n) {
            return Err(Error::DimensionMismatch {
                expected: condensed_len(n),
                found: condensed.len(),
            });
        }
        Ok(Self { n, condensed })
    }

    /// Build from a full square matrix.
    ///
    /// The matrix must be square, symmetric and have a zero diagonal;
    /// anything else is a [`Error::ShapeMismatch`].
    pub fn from_square(square: &Array2<f64>) -> Result<Self> {
        let (rows, cols) = square.dim();
        if rows != cols {
            return Err(Error::ShapeMismatch {
                expected: "square matrix".to_string(),
                actual: format!("{rows}x{cols}"),
            });
        }
        let n = rows;
        let mut condensed = Vec::with_capacity(condensed_len(n));
        for i in 0..n {
            if square[(i, i)] != 0.0 {
                return Err(Error::ShapeMismatch {
                    expected: "zero diagonal".to_string(),
                    actual: format!("D[{i}][{i}] = {}", square[(i, i)]),
                });
            }
            for j in (i + 1)..n {
                if square[(i, j)] != square[(j, i)] {
                    return Err(Error::ShapeMismatch {
                        expected: "symmetric matrix".to_string(),
                        actual: format!("D[{i}][{j}] != D[{j}][{i}]"),
                    });
                }
                condensed.push(square[(i, j)]);
            }
        }
        Ok(Self { n, condensed })
    }

    /// Number of items.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Dissimilarity between items `i` and `j`.
    ///
    /// # Panics
    ///
    /// If `i` or `j` is out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "index out of range");
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.condensed[condensed_index(self.n, i, j)],
            std::cmp::Ordering::Greater => self.condensed[condensed_index(self.n, j, i)],
        }
    }

    /// The condensed vector (strict upper triangle, row-major).
    pub fn condensed(&self) -> &[f64] {
        &self.condensed
    }

    /// Consume into the condensed vector.
    pub fn into_condensed(self) -> Vec<f64> {
        self.condensed
    }

    /// Full square form: reflected across the diagonal, diagonal zero.
    pub fn to_square(&self) -> Array2<f64> {
        let mut square = Array2::zeros((self.n, self.n));
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let d = self.condensed[condensed_index(self.n, i, j)];
                square[(i, j)] = d;
                square[(j, i)] = d;
            }
        }
        square
    }

    /// Top-left `rows × cols` block of the square view.
    pub fn head(&self, rows: usize, cols: usize) -> Vec<Vec<f64>> {
        let rows = rows.min(self.n);
        let cols = cols.min(self.n);
        (0..rows)
            .map(|i| (0..cols).map(|j| self.get(i, j)).collect())
            .collect()
    }

    /// Bytes used by the stored values.
    pub fn memory_bytes(&self) -> usize {
        self.condensed.len() * std::mem::size_of::<f64>()
    }
}
