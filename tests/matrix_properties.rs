//! Invariants of the dissimilarity matrix and the trees built from it.

use ndarray::Array2;
use proptest::prelude::*;
use shopclust::distance::{condensed_index, gower_matrix, DissimilarityMatrix};
use shopclust::{HierarchicalClustering, Linkage};

/// Mixed rows: `(data, categorical flags)`. Categorical cells are small
/// integer codes; any cell may be missing.
fn mixed_rows() -> impl Strategy<Value = (Array2<f64>, Vec<bool>)> {
    (1usize..12, 1usize..6).prop_flat_map(|(n, p)| {
        let cell = prop_oneof![
            8 => -100.0f64..100.0,
            1 => Just(f64::NAN),
        ];
        (
            proptest::collection::vec(cell, n * p),
            proptest::collection::vec(any::<bool>(), p),
        )
            .prop_map(move |(mut values, flags)| {
                for (idx, v) in values.iter_mut().enumerate() {
                    if flags[idx % p] && !v.is_nan() {
                        *v = (v.abs() as i64 % 3) as f64;
                    }
                }
                let data = Array2::from_shape_vec((n, p), values).unwrap();
                (data, flags)
            })
    })
}

proptest! {
    #[test]
    fn prop_symmetric_bounded_zero_diagonal((data, flags) in mixed_rows()) {
        let d = gower_matrix(data.view(), &flags).unwrap();
        let n = d.n();
        prop_assert_eq!(n, data.nrows());
        for i in 0..n {
            prop_assert_eq!(d.get(i, i), 0.0);
            for j in 0..n {
                let v = d.get(i, j);
                prop_assert!((0.0..=1.0).contains(&v), "d({}, {}) = {}", i, j, v);
                prop_assert_eq!(v.to_bits(), d.get(j, i).to_bits());
            }
        }
    }

    #[test]
    fn prop_condensed_round_trip_is_exact((data, flags) in mixed_rows()) {
        let d = gower_matrix(data.view(), &flags).unwrap();
        let square = d.to_square();
        let back = DissimilarityMatrix::from_square(&square).unwrap();
        prop_assert_eq!(&back, &d);

        let n = d.n();
        for i in 0..n {
            for j in (i + 1)..n {
                prop_assert_eq!(
                    d.condensed()[condensed_index(n, i, j)].to_bits(),
                    square[(i, j)].to_bits()
                );
            }
        }
    }

    #[test]
    fn prop_bit_identical_reruns((data, flags) in mixed_rows()) {
        let a = gower_matrix(data.view(), &flags).unwrap();
        let b = gower_matrix(data.view(), &flags).unwrap();
        let bits = |m: &DissimilarityMatrix| m.condensed().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(&a), bits(&b));

        let clusterer = HierarchicalClustering::new();
        prop_assert_eq!(clusterer.fit_tree(&a).unwrap(), clusterer.fit_tree(&b).unwrap());
    }

    #[test]
    fn prop_complete_linkage_tree_shape((data, flags) in mixed_rows()) {
        let d = gower_matrix(data.view(), &flags).unwrap();
        let n = d.n();
        let tree = HierarchicalClustering::new()
            .with_linkage(Linkage::Complete)
            .fit_tree(&d)
            .unwrap();

        prop_assert_eq!(tree.n_merges(), n - 1);
        prop_assert!(tree.is_monotone());

        let singletons = tree.cut_to_k(n).unwrap();
        let mut labels = singletons.labels().to_vec();
        labels.sort_unstable();
        prop_assert_eq!(labels, (1..=n).collect::<Vec<_>>());

        let one = tree.cut_to_k(1).unwrap();
        prop_assert!(one.labels().iter().all(|&l| l == 1));

        prop_assert!(tree.cut_to_k(0).is_err());
        prop_assert!(tree.cut_to_k(n + 1).is_err());
    }

    #[test]
    fn prop_cut_uses_every_label((data, flags) in mixed_rows(), k in 1usize..12) {
        let d = gower_matrix(data.view(), &flags).unwrap();
        let n = d.n();
        prop_assume!(k <= n);
        let tree = HierarchicalClustering::new().fit_tree(&d).unwrap();
        let a = tree.cut_to_k(k).unwrap();
        prop_assert_eq!(a.sizes().len(), k);
        prop_assert!(a.sizes().iter().all(|&s| s > 0));
        prop_assert_eq!(a.sizes().iter().sum::<usize>(), n);
    }
}

#[test]
fn scenario_two_groups() {
    // A and B numeric, C categorical coded x=0, y=1.
    let data = ndarray::array![
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [5.0, 5.0, 0.0],
        [5.0, 5.0, 1.0],
    ];
    let d = gower_matrix(data.view(), &[false, false, true]).unwrap();
    let tree = HierarchicalClustering::new().fit_tree(&d).unwrap();

    let first: Vec<(usize, usize)> = tree
        .merges()
        .take(2)
        .map(|m| (m.left.min(m.right), m.left.max(m.right)))
        .collect();
    assert!(first.contains(&(0, 1)));
    assert!(first.contains(&(2, 3)));

    let labels = tree.cut_to_k(2).unwrap();
    let l = labels.labels();
    assert!(l[..4].iter().all(|&g| g == l[0]));
    assert_eq!(l[4], l[5]);
    assert_ne!(l[0], l[4]);
}
