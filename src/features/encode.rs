//! One-hot (dummy) encoding into a mixed-type feature matrix.

use crate::data::{dictionary_encode, Column, Table};
use crate::error::{Error, Result};
use ndarray::Array2;
use tracing::info;

/// Encoded rows ready for the dissimilarity builder.
///
/// `columns`, `categorical` and the columns of `data` are aligned by
/// position. `row_ids[i]` is the row of the source table that matrix row `i`
/// came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMatrix {
    /// Output column names (`{column}_{level}` for indicators).
    pub columns: Vec<String>,
    /// `true` where the column came from a categorical expansion.
    pub categorical: Vec<bool>,
    /// Rows × columns values; indicators are `0.0`/`1.0`.
    pub data: Array2<f64>,
    /// Source-table row of each matrix row.
    pub row_ids: Vec<usize>,
}

impl EncodedMatrix {
    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of (expanded) columns.
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }
}

/// Dummy Encoder.
///
/// Drops every row of `table` with a missing cell, keeps numeric columns
/// first (in table order), then expands each column named in `categorical`
/// into one indicator per level observed among the kept rows, in level
/// order. Numeric columns named in `categorical` are treated as labels.
pub fn encode(table: &Table, categorical: &[&str]) -> Result<EncodedMatrix> {
    for name in categorical {
        table.require(name)?;
    }

    let row_ids: Vec<usize> = (0..table.n_rows())
        .filter(|&r| table.iter().all(|(_, col)| !col.is_missing(r)))
        .collect();

    let dropped = table.n_rows() - row_ids.len();
    let kept = table.take_rows(&row_ids);

    let mut columns: Vec<String> = Vec::new();
    let mut flags: Vec<bool> = Vec::new();
    let mut values: Vec<Vec<f64>> = Vec::new();

    for (name, col) in kept.iter() {
        if categorical.contains(&name) {
            continue;
        }
        let Some(cells) = col.as_numeric() else {
            return Err(Error::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            });
        };
        columns.push(name.to_string());
        flags.push(false);
        values.push(cells.iter().map(|v| v.unwrap_or(f64::NAN)).collect());
    }

    for (name, col) in kept.iter() {
        if !categorical.contains(&name) {
            continue;
        }
        let (codes, levels) = match col {
            Column::Categorical { codes, levels } => (codes.clone(), levels.clone()),
            Column::Numeric(_) => {
                let labels: Vec<Option<String>> = (0..col.len()).map(|r| col.label(r)).collect();
                dictionary_encode(&labels)
            }
        };

        let mut observed = vec![false; levels.len()];
        for code in codes.iter().flatten() {
            observed[*code as usize] = true;
        }
        for (level_idx, level) in levels.iter().enumerate() {
            if !observed[level_idx] {
                continue;
            }
            columns.push(format!("{name}_{level}"));
            flags.push(true);
            values.push(
                codes
                    .iter()
                    .map(|c| if *c == Some(level_idx as u32) { 1.0 } else { 0.0 })
                    .collect(),
            );
        }
    }

    let n = row_ids.len();
    let mut data = Array2::<f64>::zeros((n, columns.len()));
    for (j, col) in values.iter().enumerate() {
        for (i, &v) in col.iter().enumerate() {
            data[(i, j)] = v;
        }
    }

    info!(
        rows = n,
        dropped,
        columns = columns.len(),
        categorical = flags.iter().filter(|&&f| f).count(),
        "encoded feature matrix"
    );

    Ok(EncodedMatrix {
        columns,
        categorical: flags,
        data,
        row_ids,
    })
}
