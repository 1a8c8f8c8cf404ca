/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for random sample generation, evaluation grids, and sample splitting.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate a matrix of random points in the unit hypercube.
///
/// # Parameters
/// - `n`: Number of points to generate (rows in the output matrix).
/// - `d`: Number of spatial dimensions per point (columns in the output matrix).
/// - `seed`: Optional random seed. `Some(seed)` gives the same points on every
///   run; `None` seeds from the operating system.
///
/// # Returns
/// A `Mat<f64>` of shape `(n, d)` where each element lies in `[0.0, 1.0)`.
///
/// # Example
/// ```
/// use ferreus_mwls::generate_random_points;
///
/// let pts = generate_random_points(100, 3, Some(42));
/// assert_eq!(pts.shape(), (100, 3));
/// ```
pub fn generate_random_points(n: usize, d: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, d, |_, _| rng.random_range(0.0..1.0))
}

/// Create a regular evaluation grid from per-dimension ranges and sample counts.
///
/// The first dimension varies fastest. A count of one places the single
/// sample at the start of its range.
///
/// # Arguments
/// * `ranges` - Inclusive `(min, max)` range for each dimension.
/// * `counts` - Number of grid samples per range; must match `ranges.len()`.
///
/// # Returns
/// A `Mat<f64>` with one row per grid point and one column per dimension.
///
/// # Example
/// ```
/// use ferreus_mwls::create_evaluation_grid;
///
/// let grid = create_evaluation_grid(&[(-2.0, 2.0)], &[41]);
/// assert_eq!(grid.nrows(), 41);
/// assert!((grid[(10, 0)] + 1.0).abs() < 1e-12);
/// ```
pub fn create_evaluation_grid(ranges: &[(f64, f64)], counts: &[usize]) -> Mat<f64> {
    assert_eq!(ranges.len(), counts.len());

    let total_points: usize = counts.iter().product();

    Mat::from_fn(total_points, ranges.len(), |row_idx, col_idx| {
        let dim_points = counts[col_idx];
        let (start, end) = ranges[col_idx];
        let step = match dim_points > 1 {
            true => (end - start) / (dim_points as f64 - 1.0),
            false => 0.0,
        };

        let stride = counts[..col_idx].iter().product::<usize>();
        let index_in_dim = (row_idx / stride) % dim_points;
        start + step * index_in_dim as f64
    })
}

/// Splits a combined `(N, n + m)` sample matrix into its `(N, n)` input and
/// `(N, m)` output parts, with `m = output_dim` trailing columns.
///
/// The caller guarantees `samples.ncols() > output_dim`.
pub(crate) fn split_combined_samples(samples: &Mat<f64>, output_dim: usize) -> (Mat<f64>, Mat<f64>) {
    let (n, cols) = samples.shape();
    let d = cols - output_dim;

    let points = Mat::from_fn(n, d, |i, j| samples[(i, j)]);
    let values = Mat::from_fn(n, output_dim, |i, j| samples[(i, d + j)]);

    (points, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_points_are_reproducible() {
        let a = generate_random_points(20, 2, Some(7));
        let b = generate_random_points(20, 2, Some(7));
        assert_eq!(a, b);
        assert!((0..20).all(|i| (0..2).all(|j| (0.0..1.0).contains(&a[(i, j)]))));
    }

    #[test]
    fn evaluation_grid_varies_first_axis_fastest() {
        let grid = create_evaluation_grid(&[(0.0, 1.0), (10.0, 20.0)], &[3, 2]);
        assert_eq!(grid.shape(), (6, 2));

        let expected = [
            [0.0, 10.0],
            [0.5, 10.0],
            [1.0, 10.0],
            [0.0, 20.0],
            [0.5, 20.0],
            [1.0, 20.0],
        ];
        for (i, row) in expected.iter().enumerate() {
            assert_eq!(grid[(i, 0)], row[0]);
            assert_eq!(grid[(i, 1)], row[1]);
        }
    }

    #[test]
    fn single_count_axis_uses_range_start() {
        let grid = create_evaluation_grid(&[(0.0, 1.0), (5.0, 6.0)], &[2, 1]);
        assert_eq!(grid.shape(), (2, 2));
        assert_eq!(grid[(0, 1)], 5.0);
        assert_eq!(grid[(1, 1)], 5.0);
    }

    #[test]
    fn combined_samples_split_on_trailing_columns() {
        let samples = Mat::from_fn(4, 5, |i, j| (10 * i + j) as f64);
        let (points, values) = split_combined_samples(&samples, 2);

        assert_eq!(points.shape(), (4, 3));
        assert_eq!(values.shape(), (4, 2));
        assert_eq!(points[(2, 1)], 21.0);
        assert_eq!(values[(3, 0)], 33.0);
        assert_eq!(values[(3, 1)], 34.0);
    }
}
