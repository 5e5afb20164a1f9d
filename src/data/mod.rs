//! Column-oriented session tables.
//!
//! A [`Table`] is an ordered list of named [`Column`]s of equal length.
//! Missing cells are `None` in both column kinds.
//!
//! Categorical columns are dictionary-coded: each cell stores an index into
//! an ordered `levels` list. Level order is meaningful (quartile bins keep
//! their bin order) and drives the order of dummy columns downstream.

mod io;
mod schema;

pub use io::{read_csv, read_csv_path, write_csv};
pub use schema::{ColumnKind, Field, Schema};

use crate::error::{Error, Result};
use std::cmp::Ordering;

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Real-valued cells.
    Numeric(Vec<Option<f64>>),
    /// Dictionary-coded labels.
    Categorical {
        /// Per-row index into `levels`.
        codes: Vec<Option<u32>>,
        /// Ordered distinct labels.
        levels: Vec<String>,
    },
}

impl Column {
    /// Build a categorical column from raw labels. See [`dictionary_encode`].
    pub fn categorical_from_labels<S: AsRef<str>>(values: &[Option<S>]) -> Self {
        let (codes, levels) = dictionary_encode(values);
        Column::Categorical { codes, levels }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical { codes, .. } => codes.len(),
        }
    }

    /// True when the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of this column.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Categorical { .. } => ColumnKind::Categorical,
        }
    }

    /// Whether `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => v[row].is_none(),
            Column::Categorical { codes, .. } => codes[row].is_none(),
        }
    }

    /// Count of missing cells.
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&r| self.is_missing(r)).count()
    }

    /// Text form of a cell, `None` when missing.
    pub fn label(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(v) => v[row].map(|x| x.to_string()),
            Column::Categorical { codes, levels } => {
                codes[row].map(|c| levels[c as usize].clone())
            }
        }
    }

    /// Numeric cells, if this is a numeric column.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Categorical { .. } => None,
        }
    }

    /// Rows `rows` of this column, in the given order.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&r| v[r]).collect()),
            Column::Categorical { codes, levels } => Column::Categorical {
                codes: rows.iter().map(|&r| codes[r]).collect(),
                levels: levels.clone(),
            },
        }
    }
}

/// Dictionary-code raw labels into `(codes, sorted levels)`.
///
/// Labels that all parse as numbers sort numerically so that `"2" < "10"`.
pub fn dictionary_encode<S: AsRef<str>>(values: &[Option<S>]) -> (Vec<Option<u32>>, Vec<String>) {
    let mut levels: Vec<String> = values
        .iter()
        .flatten()
        .map(|s| s.as_ref().to_string())
        .collect();
    levels.sort_by(|a, b| compare_labels(a, b));
    levels.dedup();

    let codes = values
        .iter()
        .map(|v| {
            v.as_ref().map(|s| {
                let s = s.as_ref();
                levels
                    .binary_search_by(|l| compare_labels(l, s))
                    .map(|i| i as u32)
                    .unwrap_or_default()
            })
        })
        .collect();

    (codes, levels)
}

/// Numbers before text; numbers by value, text lexicographically.
pub(crate) fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// An ordered collection of equal-length named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(Error::DimensionMismatch {
                expected: self.n_rows,
                found: column.len(),
            });
        }
        if self.names.contains(&name) {
            return Err(Error::InvalidParameter {
                name: "column",
                message: format!("duplicate column name '{name}'"),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Builder-style [`Table::push_column`].
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(name, column)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Column by name, or [`Error::UnknownColumn`].
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Numeric cells of `name`, or an error if absent or categorical.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        self.require(name)?
            .as_numeric()
            .ok_or_else(|| Error::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            })
    }

    /// Total missing cells across all columns.
    pub fn missing_count(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    /// Restrict to rows `rows`, keeping every column.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            n_rows: rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_levels_sorted_numerically() {
        let col = Column::categorical_from_labels(&[
            Some("10"),
            Some("2"),
            None,
            Some("1"),
            Some("2"),
        ]);
        match &col {
            Column::Categorical { codes, levels } => {
                assert_eq!(levels, &vec!["1", "2", "10"]);
                assert_eq!(codes, &vec![Some(2), Some(1), None, Some(0), Some(1)]);
            }
            _ => panic!("expected categorical"),
        }
        assert_eq!(col.missing_count(), 1);
        assert_eq!(col.label(0).as_deref(), Some("10"));
    }

    #[test]
    fn test_mixed_labels_numbers_first() {
        let col = Column::categorical_from_labels(&[Some("b"), Some("3"), Some("a")]);
        let Column::Categorical { levels, .. } = col else {
            panic!("expected categorical");
        };
        assert_eq!(levels, vec!["3", "a", "b"]);
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut table = Table::new();
        table
            .push_column("a", Column::Numeric(vec![Some(1.0), Some(2.0)]))
            .unwrap();
        let err = table
            .push_column("b", Column::Numeric(vec![Some(1.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_numeric_accessor_rejects_categorical() {
        let table = Table::new()
            .with_column("c", Column::categorical_from_labels(&[Some("x")]))
            .unwrap();
        assert!(matches!(table.numeric("c"), Err(Error::ColumnType { .. })));
        assert!(matches!(table.numeric("zz"), Err(Error::UnknownColumn(_))));
    }

    #[test]
    fn test_take_rows() {
        let table = Table::new()
            .with_column("a", Column::Numeric(vec![Some(1.0), None, Some(3.0)]))
            .unwrap();
        let sub = table.take_rows(&[2, 0]);
        assert_eq!(sub.n_rows(), 2);
        assert_eq!(sub.numeric("a").unwrap(), &[Some(3.0), Some(1.0)]);
        assert_eq!(table.missing_count(), 1);
    }
}
