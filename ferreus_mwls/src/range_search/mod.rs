/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the range search capability shared by the k-d tree, cell list, and naive backends.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # range_search
//!
//! Three interchangeable answers to "which samples lie within `radius` of this
//! point". They must return identical index sets for identical inputs; only
//! their cost differs. The local solver sees them through [`RangeSearch`] only.

pub mod cell_list;
pub mod kdtree;
pub mod naive;

use crate::config::{MwlsSettings, SearchBackend};
use faer::Mat;
use std::fmt::Debug;
use std::sync::Arc;

pub use {cell_list::CellLinkedList, kdtree::KDTree, naive::NaiveSearch};

/// Fixed-radius neighbour search over an immutable set of sample points.
pub trait RangeSearch: Send + Sync + Debug {
    /// Returns the indices of every sample within `radius` of `point`
    /// (inclusive), sorted ascending. A negative or NaN radius finds nothing.
    fn neighbours(&self, point: &[f64], radius: f64) -> Vec<usize>;

    /// Which backend this is.
    fn backend(&self) -> SearchBackend;
}

/// The range search backend owned by an approximator.
#[derive(Debug)]
pub enum NeighbourSearch {
    KdTree(KDTree),
    CellList(CellLinkedList),
    Naive(NaiveSearch),
}

impl NeighbourSearch {
    /// Builds the backend selected in `settings` over `points`.
    ///
    /// `cutoff` sets the cell edge length of the cell linked list.
    pub fn build(points: Arc<Mat<f64>>, cutoff: f64, settings: &MwlsSettings) -> Self {
        match settings.backend {
            SearchBackend::KdTree => NeighbourSearch::KdTree(KDTree::new(points, settings.leaf_size)),
            SearchBackend::CellLinkedList => {
                NeighbourSearch::CellList(CellLinkedList::new(points, cutoff))
            }
            SearchBackend::Naive => NeighbourSearch::Naive(NaiveSearch::new(points)),
        }
    }
}

impl RangeSearch for NeighbourSearch {
    fn neighbours(&self, point: &[f64], radius: f64) -> Vec<usize> {
        match self {
            NeighbourSearch::KdTree(tree) => tree.neighbours(point, radius),
            NeighbourSearch::CellList(cells) => cells.neighbours(point, radius),
            NeighbourSearch::Naive(naive) => naive.neighbours(point, radius),
        }
    }

    fn backend(&self) -> SearchBackend {
        match self {
            NeighbourSearch::KdTree(tree) => tree.backend(),
            NeighbourSearch::CellList(cells) => cells.backend(),
            NeighbourSearch::Naive(naive) => naive.backend(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, dim: usize, seed: u64) -> Arc<Mat<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        Arc::new(Mat::from_fn(n, dim, |_, _| rng.random_range(0.0..1.0)))
    }

    fn all_backends(points: &Arc<Mat<f64>>, cutoff: f64) -> Vec<NeighbourSearch> {
        [
            SearchBackend::KdTree,
            SearchBackend::CellLinkedList,
            SearchBackend::Naive,
        ]
        .into_iter()
        .map(|backend| {
            let settings = MwlsSettings::builder(backend).leaf_size(4).build();
            NeighbourSearch::build(points.clone(), cutoff, &settings)
        })
        .collect()
    }

    #[test]
    fn build_respects_selected_backend() {
        let points = random_points(20, 2, 1);
        for search in all_backends(&points, 0.2) {
            let expected = match &search {
                NeighbourSearch::KdTree(_) => SearchBackend::KdTree,
                NeighbourSearch::CellList(_) => SearchBackend::CellLinkedList,
                NeighbourSearch::Naive(_) => SearchBackend::Naive,
            };
            assert_eq!(search.backend(), expected);
        }
    }

    #[test]
    fn backends_return_identical_sets() {
        for (n, d, seed, cutoff) in [
            (300usize, 1usize, 11u64, 0.05),
            (500, 2, 12, 0.1),
            (600, 3, 13, 0.2),
        ] {
            let points = random_points(n, d, seed);
            let backends = all_backends(&points, cutoff);
            let mut rng = StdRng::seed_from_u64(seed + 1000);

            for _ in 0..40 {
                // queries both on and off the sample cloud, radii up to 4x the cell size
                let q: Vec<f64> = (0..d).map(|_| rng.random_range(-0.2..1.2)).collect();
                let r = rng.random_range(0.0..(4.0 * cutoff));

                let reference = backends[2].neighbours(&q, r);
                for search in &backends[..2] {
                    assert_eq!(search.neighbours(&q, r), reference, "{:?}", search.backend());
                }
            }
        }
    }

    #[test]
    fn query_on_sample_finds_itself_at_zero_radius() {
        let points = random_points(100, 2, 5);
        for search in all_backends(&points, 0.1) {
            for i in [0usize, 17, 99] {
                let q = [points[(i, 0)], points[(i, 1)]];
                assert!(search.neighbours(&q, 0.0).contains(&i));
            }
        }
    }

    #[test]
    fn negative_or_nan_radius_finds_nothing() {
        let points = random_points(50, 3, 8);
        for search in all_backends(&points, 0.25) {
            assert!(search.neighbours(&[0.5, 0.5, 0.5], -0.1).is_empty());
            assert!(search.neighbours(&[0.5, 0.5, 0.5], f64::NAN).is_empty());
        }
    }

    #[test]
    fn huge_radius_returns_everything() {
        let points = random_points(64, 2, 21);
        let everything: Vec<usize> = (0..64).collect();
        for search in all_backends(&points, 0.01) {
            assert_eq!(search.neighbours(&[0.5, 0.5], 10.0), everything);
        }
    }
}
