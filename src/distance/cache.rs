//! Content-addressed memoization of dissimilarity matrices.
//!
//! The cache is an ordinary value passed to whoever needs it; there is no
//! process-wide instance. Keys hash the exact builder inputs (values, column
//! names, categorical flags) together with the feature-set id, so a hit is
//! only possible when recomputation would give the same matrix.

use super::matrix::DissimilarityMatrix;
use crate::error::Result;
use crate::features::EncodedMatrix;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Key of a cached matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: [u8; 32],
    feature_set: String,
}

impl CacheKey {
    /// Key for `matrix` built under feature set `feature_set`.
    pub fn new(matrix: &EncodedMatrix, feature_set: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((matrix.n_rows() as u64).to_le_bytes());
        hasher.update((matrix.n_cols() as u64).to_le_bytes());
        for (name, &flag) in matrix.columns.iter().zip(&matrix.categorical) {
            hasher.update((name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update([flag as u8]);
        }
        for v in matrix.data.iter() {
            hasher.update(v.to_bits().to_le_bytes());
        }
        Self {
            digest: hasher.finalize().into(),
            feature_set: feature_set.to_string(),
        }
    }

    /// Hex digest of the table content.
    pub fn digest_hex(&self) -> String {
        self.digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Feature-set id part of the key.
    pub fn feature_set(&self) -> &str {
        &self.feature_set
    }
}

/// Map from [`CacheKey`] to a previously computed matrix.
#[derive(Debug, Default)]
pub struct DissimilarityCache {
    entries: HashMap<CacheKey, Arc<DissimilarityMatrix>>,
    hits: usize,
    misses: usize,
}

impl DissimilarityCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached matrix for `key`, computing and storing it with `compute` on a
    /// miss. A failed computation stores nothing.
    pub fn get_or_try_insert<F>(&mut self, key: CacheKey, compute: F) -> Result<Arc<DissimilarityMatrix>>
    where
        F: FnOnce() -> Result<DissimilarityMatrix>,
    {
        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            debug!(digest = %key.digest_hex(), "dissimilarity cache hit");
            return Ok(Arc::clone(hit));
        }
        self.misses += 1;
        debug!(digest = %key.digest_hex(), "dissimilarity cache miss");
        let matrix = Arc::new(compute()?);
        self.entries.insert(key, Arc::clone(&matrix));
        Ok(matrix)
    }

    /// Whether `key` is cached.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached matrices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` so far.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::gower_matrix;
    use crate::error::Error;
    use ndarray::array;

    fn encoded() -> EncodedMatrix {
        EncodedMatrix {
            columns: vec!["a".into(), "b_x".into()],
            categorical: vec![false, true],
            data: array![[0.0, 1.0], [2.0, 0.0], [1.0, 1.0]],
            row_ids: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_hit_returns_same_matrix() {
        let m = encoded();
        let mut cache = DissimilarityCache::new();
        let key = CacheKey::new(&m, "fs");

        let first = cache
            .get_or_try_insert(key.clone(), || gower_matrix(m.data.view(), &m.categorical))
            .unwrap();
        let second = cache
            .get_or_try_insert(key.clone(), || panic!("should not recompute"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), (1, 1));
        assert!(cache.contains(&key));
    }

    #[test]
    fn test_key_depends_on_content_and_feature_set() {
        let m = encoded();
        let mut other = encoded();
        other.data[(0, 0)] = 0.5;
        let mut flipped = encoded();
        flipped.categorical[0] = true;

        let base = CacheKey::new(&m, "fs");
        assert_eq!(base, CacheKey::new(&encoded(), "fs"));
        assert_ne!(base, CacheKey::new(&other, "fs"));
        assert_ne!(base, CacheKey::new(&flipped, "fs"));
        assert_ne!(base, CacheKey::new(&m, "other"));
        assert_eq!(base.digest_hex().len(), 64);
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let m = encoded();
        let mut cache = DissimilarityCache::new();
        let key = CacheKey::new(&m, "fs");
        let res = cache.get_or_try_insert(key.clone(), || Err(Error::EmptyInput));
        assert!(res.is_err());
        assert!(cache.is_empty());
    }
}
