/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the brute-force range search used as a reference and for tiny sample sets.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use super::RangeSearch;
use crate::config::SearchBackend;
use faer::Mat;
use ferreus_mwls_utils::get_distance_to_row;
use std::sync::Arc;

/// Range search that checks every sample.
#[derive(Debug, Clone)]
pub struct NaiveSearch {
    points: Arc<Mat<f64>>,
}

impl NaiveSearch {
    pub fn new(points: Arc<Mat<f64>>) -> Self {
        Self { points }
    }
}

impl RangeSearch for NaiveSearch {
    fn neighbours(&self, point: &[f64], radius: f64) -> Vec<usize> {
        if !(radius >= 0.0) {
            return Vec::new();
        }
        (0..self.points.nrows())
            .filter(|&i| get_distance_to_row(point, &self.points, i) <= radius)
            .collect()
    }

    fn backend(&self) -> SearchBackend {
        SearchBackend::Naive
    }
}
