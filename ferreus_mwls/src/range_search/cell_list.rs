/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements a uniform-grid cell linked list for fixed-radius neighbour queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use super::RangeSearch;
use crate::config::SearchBackend;
use faer::Mat;
use ferreus_mwls_utils::{get_distance_to_row, get_pointarray_extents};
use itertools::Itertools;
use std::collections::HashMap;
use std::sync::Arc;

/// Integer grid coordinates of a cell.
type CellKey = Vec<i64>;

/// Samples bucketed into cubic cells of edge `cell_size`.
///
/// The grid is anchored at the lower corner of the samples' bounding box, so
/// every sample lands in a cell with non-negative coordinates. Only occupied
/// cells are stored.
///
/// A query of radius `r` visits every cell overlapping the box
/// `[q - r, q + r]`. For the default radius that is the 3^d block around the
/// query's cell; larger radii widen the ring accordingly. When the box would
/// cover more cells than are occupied, the occupied cells are scanned instead.
#[derive(Debug)]
pub struct CellLinkedList {
    points: Arc<Mat<f64>>,
    cell_size: f64,
    origin: Vec<f64>,
    /// Highest occupied cell coordinate per axis.
    max_cell: Vec<i64>,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl CellLinkedList {
    /// Buckets `points` into cells of edge `cell_size`.
    ///
    /// `cell_size` must be positive and finite.
    pub fn new(points: Arc<Mat<f64>>, cell_size: f64) -> Self {
        let dim = points.ncols();
        let extents = get_pointarray_extents(&points);
        let origin = if extents.is_empty() {
            vec![0.0; dim]
        } else {
            extents[..dim].to_vec()
        };

        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        let mut max_cell = vec![0i64; dim];

        for i in 0..points.nrows() {
            let key: CellKey = (0..dim)
                .map(|k| cell_coordinate(points[(i, k)], origin[k], cell_size))
                .collect();
            for (m, &c) in max_cell.iter_mut().zip(key.iter()) {
                *m = (*m).max(c);
            }
            cells.entry(key).or_default().push(i);
        }

        Self {
            points,
            cell_size,
            origin,
            max_cell,
            cells,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of occupied cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Inclusive per-axis cell range covering `[q - r, q + r]`, clipped to the
    /// occupied grid. `None` when the box misses the grid entirely.
    fn cell_range(&self, point: &[f64], radius: f64) -> Option<Vec<(i64, i64)>> {
        let mut ranges = Vec::with_capacity(point.len());
        for (k, &q) in point.iter().enumerate() {
            let lo = cell_coordinate(q - radius, self.origin[k], self.cell_size).max(0);
            let hi = cell_coordinate(q + radius, self.origin[k], self.cell_size)
                .min(self.max_cell[k]);
            if lo > hi {
                return None;
            }
            ranges.push((lo, hi));
        }
        Some(ranges)
    }

    fn push_within(&self, members: &[usize], point: &[f64], radius: f64, out: &mut Vec<usize>) {
        out.extend(
            members
                .iter()
                .copied()
                .filter(|&i| get_distance_to_row(point, &self.points, i) <= radius),
        );
    }
}

impl RangeSearch for CellLinkedList {
    fn neighbours(&self, point: &[f64], radius: f64) -> Vec<usize> {
        let mut result = Vec::new();
        if self.cells.is_empty() || !(radius >= 0.0) || point.iter().any(|q| !q.is_finite()) {
            return result;
        }

        let Some(ranges) = self.cell_range(point, radius) else {
            return result;
        };

        let visited = ranges
            .iter()
            .fold(1usize, |acc, &(lo, hi)| {
                let span = usize::try_from(hi.abs_diff(lo)).unwrap_or(usize::MAX);
                acc.saturating_mul(span.saturating_add(1))
            });

        if visited > self.cells.len() {
            for (key, members) in &self.cells {
                let inside = key
                    .iter()
                    .zip(ranges.iter())
                    .all(|(&c, &(lo, hi))| lo <= c && c <= hi);
                if inside {
                    self.push_within(members, point, radius, &mut result);
                }
            }
        } else {
            for key in ranges.iter().map(|&(lo, hi)| lo..=hi).multi_cartesian_product() {
                if let Some(members) = self.cells.get(&key) {
                    self.push_within(members, point, radius, &mut result);
                }
            }
        }

        result.sort_unstable();
        result
    }

    fn backend(&self) -> SearchBackend {
        SearchBackend::CellLinkedList
    }
}

/// Cell coordinate of `x` along one axis. Saturates for values far off the grid.
#[inline]
fn cell_coordinate(x: f64, origin: f64, cell_size: f64) -> i64 {
    ((x - origin) / cell_size).floor() as i64
}
