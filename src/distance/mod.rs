//! Pairwise dissimilarities over encoded session rows.
//!
//! - [`gower_matrix`]: mixed-type Gower dissimilarity
//! - [`DissimilarityMatrix`]: symmetric result, condensed storage
//! - [`DissimilarityCache`]: explicit memoization keyed by input content

mod cache;
mod gower;
mod matrix;

pub use cache::{CacheKey, DissimilarityCache};
pub use gower::gower_matrix;
pub use matrix::{condensed_index, condensed_len, DissimilarityMatrix};
