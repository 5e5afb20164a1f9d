//! Run configuration.
//!
//! Loaded from JSON; every field is optional and falls back to the
//! shoppers defaults.
//!
//! ```json
//! {
//!   "linkage": "complete",
//!   "cuts": [3, 4],
//!   "color_thresholds": [[3, 0.46], [4, 0.435]]
//! }
//! ```

use crate::cluster::Linkage;
use crate::error::{Error, Result};
use crate::features::FeatureSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline and report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Features entering the distance computation.
    pub features: FeatureSet,
    /// Agglomeration rule.
    pub linkage: Linkage,
    /// Group counts to cut the tree into.
    pub cuts: Vec<usize>,
    /// `(groups, height)` pairs summarized against the tree.
    pub color_thresholds: Vec<(usize, f64)>,
    /// Columns cross-tabulated against the first cut.
    pub crosstab_rows: Vec<String>,
    /// Observed outcome compared with the first cut.
    pub outcome_column: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            features: FeatureSet::shoppers(),
            linkage: Linkage::Complete,
            cuts: vec![3, 4],
            color_thresholds: vec![(3, 0.46), (4, 0.435)],
            crosstab_rows: vec!["VisitorType".to_string(), "SpecialDay".to_string()],
            outcome_column: "Revenue".to_string(),
        }
    }
}

impl Config {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.check()?;
        Ok(config)
    }

    /// Replace the cuts, e.g. from a command-line flag.
    pub fn with_cuts(mut self, cuts: Vec<usize>) -> Self {
        self.cuts = cuts;
        self
    }

    /// Reject settings no run could use.
    pub fn check(&self) -> Result<()> {
        if self.cuts.is_empty() {
            return Err(Error::InvalidParameter {
                name: "cuts",
                message: "at least one cut is required".to_string(),
            });
        }
        if self.cuts.contains(&0) {
            return Err(Error::InvalidParameter {
                name: "cuts",
                message: "cluster counts must be positive".to_string(),
            });
        }
        if let Some(&(_, t)) = self
            .color_thresholds
            .iter()
            .find(|(_, t)| !t.is_finite() || *t < 0.0)
        {
            return Err(Error::InvalidParameter {
                name: "color_thresholds",
                message: format!("threshold {t} is not a non-negative number"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.linkage, Linkage::Complete);
        assert_eq!(config.cuts, vec![3, 4]);
        assert_eq!(config.features.id, "shoppers-navigation-temporal");
        assert_eq!(config.outcome_column, "Revenue");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config::default().with_cuts(vec![2, 5]);
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"linkage": "average", "cuts": [2]}"#).unwrap();
        assert_eq!(config.linkage, Linkage::Average);
        assert_eq!(config.cuts, vec![2]);
        assert_eq!(config.color_thresholds, vec![(3, 0.46), (4, 0.435)]);
        assert_eq!(config.features, FeatureSet::shoppers());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"crosstab_rows": ["Region"]}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.crosstab_rows, vec!["Region"]);
        assert_eq!(config.cuts, vec![3, 4]);
    }

    #[test]
    fn test_load_rejects_zero_cut() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cuts": [0, 3]}}"#).unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(Error::InvalidParameter { name: "cuts", .. })
        ));
    }

    #[test]
    fn test_load_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(Config::load(file.path()), Err(Error::Json(_))));
    }
}
