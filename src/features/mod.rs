//! Feature selection and encoding.
//!
//! A [`FeatureSet`] names the columns that enter the distance computation
//! and the role each plays:
//!
//! | Role | Source | Distance semantics |
//! |------|--------|--------------------|
//! | `Numeric` | numeric column | range-scaled absolute difference |
//! | `Categorical` | any column | mismatch indicator (after one-hot) |
//! | `Binned` | numeric column | quartile bin, then categorical |
//!
//! The set is validated against a table once ([`FeatureSet::validate`])
//! before selection, so later stages never look columns up by a name that
//! might not exist.

mod binning;
mod encode;

pub use binning::{qcut, quantile_edges, quantile_sorted, sorted_present, Bins};
pub use encode::{encode, EncodedMatrix};

use crate::data::{Column, ColumnKind, Table};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How a selected feature enters the distance computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FeatureRole {
    /// Copied as-is from a numeric column.
    Numeric,
    /// Copied as-is and one-hot encoded. Numeric columns are stringified.
    Categorical,
    /// Equal-frequency bins of a numeric `source` column.
    Binned {
        /// Column to bin.
        source: String,
        /// Requested number of bins.
        quantiles: usize,
    },
}

/// A selected (or derived) column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Output column name.
    pub name: String,
    /// Role of the column.
    #[serde(flatten)]
    pub role: FeatureRole,
}

impl Feature {
    /// Numeric feature.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: FeatureRole::Numeric,
        }
    }

    /// Categorical feature.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: FeatureRole::Categorical,
        }
    }

    /// `name` holds `quantiles` equal-frequency bins of `source`.
    pub fn binned(name: impl Into<String>, source: impl Into<String>, quantiles: usize) -> Self {
        Self {
            name: name.into(),
            role: FeatureRole::Binned {
                source: source.into(),
                quantiles,
            },
        }
    }

    /// Whether this feature is one-hot encoded downstream.
    pub fn is_categorical(&self) -> bool {
        !matches!(self.role, FeatureRole::Numeric)
    }
}

/// An identified, ordered list of features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Identifier used as part of dissimilarity cache keys.
    pub id: String,
    /// Features in output order.
    pub features: Vec<Feature>,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::shoppers()
    }
}

impl FeatureSet {
    /// Feature set from parts.
    pub fn new(id: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            id: id.into(),
            features,
        }
    }

    /// Navigation pattern plus temporal indicators of a session.
    ///
    /// Navigation: page counts per section, quartile bins of bounce and exit
    /// rates, visitor type. Temporal: proximity to a special day, month,
    /// weekend flag.
    pub fn shoppers() -> Self {
        Self::new(
            "shoppers-navigation-temporal",
            vec![
                Feature::numeric("Administrative"),
                Feature::numeric("Informational"),
                Feature::numeric("ProductRelated"),
                Feature::binned("BounceRates_cat", "BounceRates", 4),
                Feature::binned("ExitRates_cat", "ExitRates", 4),
                Feature::categorical("VisitorType"),
                Feature::numeric("SpecialDay"),
                Feature::categorical("Month"),
                Feature::categorical("Weekend"),
            ],
        )
    }

    /// Output column names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Names of features that are one-hot encoded.
    pub fn categorical_names(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|f| f.is_categorical())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Check the set against `table`.
    ///
    /// Every referenced column must exist ([`Error::InvalidSchema`] lists all
    /// absent ones); numeric and binned sources must be numeric; output names
    /// must be unique; bin counts must be positive.
    pub fn validate(&self, table: &Table) -> Result<()> {
        if self.features.is_empty() {
            return Err(Error::InvalidParameter {
                name: "features",
                message: "feature set is empty".to_string(),
            });
        }

        let mut missing = Vec::new();
        for feature in &self.features {
            let source = match &feature.role {
                FeatureRole::Binned { source, .. } => source,
                _ => &feature.name,
            };
            if table.column(source).is_none() && !missing.contains(source) {
                missing.push(source.clone());
            }
        }
        if !missing.is_empty() {
            return Err(Error::InvalidSchema { missing });
        }

        for (i, feature) in self.features.iter().enumerate() {
            if self.features[..i].iter().any(|f| f.name == feature.name) {
                return Err(Error::InvalidParameter {
                    name: "features",
                    message: format!("duplicate feature '{}'", feature.name),
                });
            }
            match &feature.role {
                FeatureRole::Numeric => {
                    table.numeric(&feature.name)?;
                }
                FeatureRole::Binned { source, quantiles } => {
                    table.numeric(source)?;
                    if *quantiles == 0 {
                        return Err(Error::InvalidParameter {
                            name: "quantiles",
                            message: format!("'{}' needs at least one bin", feature.name),
                        });
                    }
                }
                FeatureRole::Categorical => {}
            }
        }
        Ok(())
    }

    /// Feature Selector: the reduced table of exactly these features.
    ///
    /// Binned features are derived here; numeric columns used as categorical
    /// features are converted to labels. Pure: `table` is untouched.
    pub fn select(&self, table: &Table) -> Result<Table> {
        self.validate(table)?;

        let mut out = Table::new();
        for feature in &self.features {
            let column = match &feature.role {
                FeatureRole::Numeric => table.require(&feature.name)?.clone(),
                FeatureRole::Categorical => to_categorical(table.require(&feature.name)?),
                FeatureRole::Binned { source, quantiles } => {
                    let bins = qcut(table.numeric(source)?, *quantiles);
                    info!(
                        feature = %feature.name,
                        source = %source,
                        bins = bins.n_bins(),
                        "binned continuous column"
                    );
                    bins.into_column()
                }
            };
            out.push_column(feature.name.clone(), column)?;
        }
        Ok(out)
    }
}

fn to_categorical(column: &Column) -> Column {
    match column.kind() {
        ColumnKind::Categorical => column.clone(),
        ColumnKind::Numeric => {
            let labels: Vec<Option<String>> = (0..column.len()).map(|r| column.label(r)).collect();
            Column::categorical_from_labels(&labels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new()
            .with_column("n", Column::Numeric(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]))
            .unwrap()
            .with_column(
                "c",
                Column::categorical_from_labels(&[Some("a"), Some("b"), Some("a"), None]),
            )
            .unwrap()
            .with_column("code", Column::Numeric(vec![Some(2.0), Some(1.0), Some(2.0), Some(1.0)]))
            .unwrap()
    }

    #[test]
    fn test_select_order_and_roles() {
        let set = FeatureSet::new(
            "t",
            vec![
                Feature::categorical("c"),
                Feature::binned("n_cat", "n", 2),
                Feature::numeric("n"),
                Feature::categorical("code"),
            ],
        );
        let out = set.select(&table()).unwrap();
        assert_eq!(out.names(), &["c", "n_cat", "n", "code"]);
        assert_eq!(out.require("n_cat").unwrap().kind(), ColumnKind::Categorical);
        assert_eq!(out.require("code").unwrap().kind(), ColumnKind::Categorical);
        assert_eq!(out.require("code").unwrap().label(1).as_deref(), Some("1"));
    }

    #[test]
    fn test_validate_lists_missing_columns() {
        let set = FeatureSet::new(
            "t",
            vec![
                Feature::numeric("x"),
                Feature::binned("y_cat", "y", 4),
                Feature::numeric("n"),
            ],
        );
        match set.validate(&table()) {
            Err(Error::InvalidSchema { missing }) => assert_eq!(missing, vec!["x", "y"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_binning_categorical() {
        let set = FeatureSet::new("t", vec![Feature::binned("c_cat", "c", 4)]);
        assert!(matches!(set.validate(&table()), Err(Error::ColumnType { .. })));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let set = FeatureSet::new("t", vec![Feature::numeric("n"), Feature::numeric("n")]);
        assert!(matches!(
            set.validate(&table()),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_shoppers_set_roles() {
        let set = FeatureSet::shoppers();
        assert_eq!(set.features.len(), 9);
        assert_eq!(
            set.categorical_names(),
            vec!["BounceRates_cat", "ExitRates_cat", "VisitorType", "Month", "Weekend"]
        );
    }

    #[test]
    fn test_feature_set_json_shape() {
        let json = serde_json::to_string(&Feature::binned("b", "src", 4)).unwrap();
        assert_eq!(json, r#"{"name":"b","role":"binned","source":"src","quantiles":4}"#);
        let back: Feature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Feature::binned("b", "src", 4));
    }
}
