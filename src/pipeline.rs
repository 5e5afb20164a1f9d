//! End-to-end clustering run.
//!
//! ```text
//! raw table ─▶ select ─▶ encode ─▶ gower ─▶ linkage ─▶ cut(k) ─▶ join
//! ```
//!
//! Every stage is pure; the raw table is never modified. The only state
//! that can outlive a run is the caller-owned [`DissimilarityCache`].

use crate::cluster::{HierarchicalClustering, Linkage};
use crate::config::Config;
use crate::data::{Column, Table};
use crate::distance::{gower_matrix, CacheKey, DissimilarityCache, DissimilarityMatrix};
use crate::error::{Error, Result};
use crate::features::{encode, EncodedMatrix, FeatureSet};
use crate::hierarchy::{validate_linkage, ClusterAssignment, LinkageTree};
use std::sync::Arc;
use tracing::{info, warn};

/// Configured run: features, linkage rule and cuts.
#[derive(Debug, Clone)]
pub struct Pipeline {
    features: FeatureSet,
    linkage: Linkage,
    cuts: Vec<usize>,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Selected (and binned) columns, all source rows.
    pub selected: Table,
    /// One-hot matrix over the rows with no missing feature.
    pub encoded: EncodedMatrix,
    /// Pairwise Gower dissimilarities between encoded rows.
    pub dissimilarity: Arc<DissimilarityMatrix>,
    /// Full merge history.
    pub tree: LinkageTree,
    /// One assignment per requested cut, in request order.
    pub assignments: Vec<ClusterAssignment>,
}

impl PipelineOutput {
    /// Assignment for `k` groups, if it was requested.
    pub fn assignment(&self, k: usize) -> Option<&ClusterAssignment> {
        self.assignments.iter().find(|a| a.k() == k)
    }

    /// Source rows removed by the encoder for missing features.
    pub fn dropped_rows(&self) -> usize {
        self.selected.n_rows() - self.encoded.n_rows()
    }
}

impl Pipeline {
    /// Complete linkage cut into 3 and 4 groups.
    pub fn new(features: FeatureSet) -> Self {
        Self {
            features,
            linkage: Linkage::Complete,
            cuts: vec![3, 4],
        }
    }

    /// Features, linkage and cuts taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            features: config.features.clone(),
            linkage: config.linkage,
            cuts: config.cuts.clone(),
        }
    }

    /// Use another linkage rule.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Replace the group counts to cut into.
    pub fn with_cuts(mut self, cuts: Vec<usize>) -> Self {
        self.cuts = cuts;
        self
    }

    /// Feature set the run selects and encodes.
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Group counts, in the order assignments are returned.
    pub fn cuts(&self) -> &[usize] {
        &self.cuts
    }

    /// Run every stage on `table`.
    ///
    /// With a cache, the dissimilarity matrix is looked up by the content of
    /// the encoded matrix and the feature-set id before it is recomputed.
    pub fn run(
        &self,
        table: &Table,
        cache: Option<&mut DissimilarityCache>,
    ) -> Result<PipelineOutput> {
        if table.n_rows() == 0 {
            return Err(Error::EmptyInput);
        }

        let selected = self.features.select(table)?;
        info!(
            rows = selected.n_rows(),
            features = selected.n_cols(),
            feature_set = %self.features.id,
            "selected features"
        );

        let encoded = encode(&selected, &self.features.categorical_names())?;
        let n = encoded.n_rows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        // Cuts are checked before the quadratic work starts.
        if let Some(&k) = self.cuts.iter().find(|&&k| k == 0 || k > n) {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }

        let build = || gower_matrix(encoded.data.view(), &encoded.categorical);
        let dissimilarity = match cache {
            Some(cache) => {
                let key = CacheKey::new(&encoded, &self.features.id);
                cache.get_or_try_insert(key, build)?
            }
            None => Arc::new(build()?),
        };

        let tree = HierarchicalClustering::new()
            .with_linkage(self.linkage)
            .fit_tree(&dissimilarity)?;
        let report = validate_linkage(&tree);
        for issue in &report.issues {
            warn!(%issue, "linkage tree check");
        }

        let assignments = self
            .cuts
            .iter()
            .map(|&k| tree.cut_to_k(k))
            .collect::<Result<Vec<_>>>()?;
        for a in &assignments {
            info!(k = a.k(), sizes = ?a.sizes(), "cut linkage tree");
        }

        Ok(PipelineOutput {
            selected,
            encoded,
            dissimilarity,
            tree,
            assignments,
        })
    }
}

/// Name of the joined label column for a `k`-group cut.
pub fn group_column(k: usize) -> String {
    format!("group_{k}")
}

/// `table` plus one `group_{k}` column per cut.
///
/// Rows the encoder dropped get a missing label. `table` must be the table
/// the output was computed from.
pub fn join_assignments(table: &Table, output: &PipelineOutput) -> Result<Table> {
    if table.n_rows() != output.selected.n_rows() {
        return Err(Error::DimensionMismatch {
            expected: output.selected.n_rows(),
            found: table.n_rows(),
        });
    }

    let mut joined = table.clone();
    for assignment in &output.assignments {
        let mut labels: Vec<Option<String>> = vec![None; table.n_rows()];
        for (i, &row) in output.encoded.row_ids.iter().enumerate() {
            labels[row] = Some(assignment.label(i).to_string());
        }
        joined.push_column(group_column(assignment.k()), Column::categorical_from_labels(&labels))?;
    }
    Ok(joined)
}
