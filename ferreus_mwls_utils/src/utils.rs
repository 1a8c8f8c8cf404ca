/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose utilities for distances, extents, and basis sizing.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;

/// Calculates the euclidean distance between two points.
///
/// Every range search backend measures distance with this function, so that
/// all of them agree on which samples sit exactly on the search radius.
///
/// # Examples
///
/// ```
/// use ferreus_mwls_utils::get_distance;
///
/// let dist = get_distance(&[1.0, 2.0], &[4.0, 6.0]);
///
/// assert_eq!(dist, 5.0);
/// ```
#[inline(always)]
pub fn get_distance(target: &[f64], source: &[f64]) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist.sqrt()
}

/// Calculates the euclidean distance between a point and one row of a point matrix.
///
/// Equivalent to [`get_distance`] with the row copied out, without the copy.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_mwls_utils::get_distance_to_row;
///
/// let points = mat![
///     [0.0, 0.0],
///     [3.0, 4.0f64],
/// ];
///
/// assert_eq!(get_distance_to_row(&[0.0, 0.0], &points, 1), 5.0);
/// ```
#[inline(always)]
pub fn get_distance_to_row(target: &[f64], points: &Mat<f64>, row: usize) -> f64 {
    let mut dist = 0.0;
    for (col, t) in target.iter().enumerate() {
        let diff = t - points[(row, col)];
        dist += diff * diff;
    }
    dist.sqrt()
}

/// Computes the axis aligned bounding box (AABB) extents of a matrix of points.
///
/// Returns a flat vector containing the minimum and maximum values along each column (dimension)
/// of the input matrix. The result is arranged as:
///
/// `[min_0, min_1, ..., min_n, max_0, max_1, ..., max_n]`
///
/// An empty matrix yields an empty vector.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_mwls_utils::get_pointarray_extents;
///
/// let points = mat![
///     [1.0, 2.0],
///     [3.0, -1.0],
///     [0.5, 4.0f64]
/// ];
/// let extents = get_pointarray_extents(&points);
/// assert_eq!(extents, vec![0.5, -1.0, 3.0, 4.0]);
/// ```
pub fn get_pointarray_extents(points: &Mat<f64>) -> Vec<f64> {
    let (nrows, ncols) = points.shape();
    if nrows == 0 {
        return Vec::new();
    }

    let mut extents = vec![0.0; 2 * ncols];

    for col in 0..ncols {
        extents[col] = points[(0, col)];
        extents[col + ncols] = points[(0, col)];
    }

    for row in 1..nrows {
        for col in 0..ncols {
            let item = points[(row, col)];
            if item < extents[col] {
                extents[col] = item;
            }
            if item > extents[col + ncols] {
                extents[col + ncols] = item;
            }
        }
    }

    extents
}

/// Binomial coefficient `C(n, k)`.
///
/// The number of monomials in `d` variables with total degree `<= p`
/// is `binomial(d + p, p)`.
///
/// # Examples
///
/// ```
/// use ferreus_mwls_utils::binomial;
///
/// // 1, x, y, x^2, xy, y^2
/// assert_eq!(binomial(2 + 2, 2), 6);
/// assert_eq!(binomial(5, 0), 1);
/// assert_eq!(binomial(3, 5), 0);
/// ```
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}

/// Like [`binomial`], but returns `None` instead of overflowing.
///
/// # Examples
///
/// ```
/// use ferreus_mwls_utils::checked_binomial;
///
/// assert_eq!(checked_binomial(20 + 3, 3), Some(1771));
/// assert_eq!(checked_binomial(220, 200), None);
/// ```
pub fn checked_binomial(n: usize, k: usize) -> Option<usize> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    (0..k).try_fold(1usize, |acc, i| Some(acc.checked_mul(n - i)? / (i + 1)))
}
