//! # shopclust
//!
//! Mixed-type clustering of e-commerce browsing sessions: Gower
//! dissimilarities, complete-linkage trees, flat cuts and a text report.
//!
//! ```text
//! CSV ─▶ data::Table ─▶ features (select, bin, one-hot) ─▶ distance::gower_matrix
//!     ─▶ cluster::HierarchicalClustering ─▶ hierarchy::LinkageTree::cut_to_k ─▶ report
//! ```
//!
//! **Default build** is single-threaded. The `parallel` feature computes
//! dissimilarity rows with rayon; results are bit-identical.

pub mod cluster;
pub mod config;
pub mod data;
pub mod distance;
/// Error types used across `shopclust`.
pub mod error;
pub mod features;
pub mod hierarchy;
pub mod metrics;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};

pub use cluster::{HierarchicalClustering, Linkage};
pub use config::Config;
pub use data::{read_csv, read_csv_path, write_csv, Column, ColumnKind, Schema, Table};
pub use distance::{gower_matrix, DissimilarityCache, DissimilarityMatrix};
pub use features::{encode, EncodedMatrix, Feature, FeatureRole, FeatureSet};
pub use hierarchy::{ClusterAssignment, HealthCheck, LinkageTree, Merge};
pub use metrics::{nmi, purity, Crosstab};
pub use pipeline::{join_assignments, Pipeline, PipelineOutput};
pub use report::{Report, TextTable};
