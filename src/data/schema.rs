//! Column schema for session tables.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Counters, durations, rates.
    Numeric,
    /// Labels compared by equality only.
    Categorical,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// A named, typed column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column header.
    pub name: String,
    /// Declared kind.
    pub kind: ColumnKind,
}

impl Field {
    /// Numeric field.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
        }
    }

    /// Categorical field.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
        }
    }
}

/// The set of columns a table must provide.
///
/// Columns present in a file but absent from the schema are still loaded;
/// their kind is inferred from content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Schema from explicit fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Empty schema: nothing required, every kind inferred.
    pub fn infer() -> Self {
        Self::default()
    }

    /// The online shoppers purchasing intention dataset (Sakar et al., 2018).
    ///
    /// 12 330 sessions, 10 numeric and 8 categorical attributes. The
    /// integer-coded columns (`OperatingSystems`, `Browser`, `Region`,
    /// `TrafficType`) are identifiers, not magnitudes.
    pub fn shoppers() -> Self {
        let numeric = [
            "Administrative",
            "Administrative_Duration",
            "Informational",
            "Informational_Duration",
            "ProductRelated",
            "ProductRelated_Duration",
            "BounceRates",
            "ExitRates",
            "PageValues",
            "SpecialDay",
        ];
        let categorical = [
            "Month",
            "OperatingSystems",
            "Browser",
            "Region",
            "TrafficType",
            "VisitorType",
            "Weekend",
            "Revenue",
        ];
        let fields = numeric
            .iter()
            .map(|n| Field::numeric(*n))
            .chain(categorical.iter().map(|n| Field::categorical(*n)))
            .collect();
        Self { fields }
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Declared kind of `name`, if the schema mentions it.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// Check that every declared field appears among `headers`.
    pub fn validate_headers<'a>(&self, headers: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let headers: Vec<&str> = headers.into_iter().collect();
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| !headers.contains(&f.name.as_str()))
            .map(|f| f.name.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidSchema { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shoppers_schema_shape() {
        let schema = Schema::shoppers();
        assert_eq!(schema.fields().len(), 18);
        assert_eq!(schema.kind_of("BounceRates"), Some(ColumnKind::Numeric));
        assert_eq!(schema.kind_of("Browser"), Some(ColumnKind::Categorical));
        assert_eq!(schema.kind_of("Nope"), None);
    }

    #[test]
    fn test_validate_headers_reports_all_missing() {
        let schema = Schema::new(vec![
            Field::numeric("a"),
            Field::categorical("b"),
            Field::numeric("c"),
        ]);
        let err = schema.validate_headers(["a"]).unwrap_err();
        match err {
            Error::InvalidSchema { missing } => assert_eq!(missing, vec!["b", "c"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(schema.validate_headers(["c", "b", "a", "extra"]).is_ok());
    }
}
