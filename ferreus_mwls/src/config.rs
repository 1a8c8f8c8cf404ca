/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the range search backend choice and the settings used to build MWLS approximators.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares the range search backend choice and the settings used to build approximators.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to answer "which samples lie within distance `d` of this point".
///
/// All three return exactly the same samples for the same query; they only
/// differ in cost.
///
/// - `KdTree`: balanced k-d tree with bucketed leaves. The default, and the best
///   general choice.
/// - `CellLinkedList`: uniform grid with cell edge equal to the cutoff distance.
///   Cheap to build and very fast when samples are evenly spread and queries
///   use the default radius.
/// - `Naive`: scans every sample. Only sensible for very small sample sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchBackend {
    KdTree,
    CellLinkedList,
    Naive,
}

impl Default for SearchBackend {
    fn default() -> Self {
        SearchBackend::KdTree
    }
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackend::KdTree => write!(f, "k-d tree"),
            SearchBackend::CellLinkedList => write!(f, "cell linked list"),
            SearchBackend::Naive => write!(f, "naive"),
        }
    }
}

/// Settings controlling how an [`MwlsApproximator`](crate::MwlsApproximator) is built.
///
/// ### Default Values
/// - `backend`: [`SearchBackend::KdTree`]
/// - `max_degree`: `2`
/// - `leaf_size`: `10`
/// - `output_dim`: `1`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MwlsSettings {
    /// Range search backend used to gather the samples of each local fit.
    pub backend: SearchBackend,

    /// Maximum total degree of the local polynomials.
    ///
    /// The number of basis monomials grows as `C(dimensions + max_degree, max_degree)`
    /// and every local fit needs at least that many well spread neighbours to be
    /// determined. Queries with too few neighbours fall back to zero coefficients.
    pub max_degree: usize,

    /// Maximum number of points held in a k-d tree leaf. Larger leaves make the
    /// tree shallower at the cost of longer linear scans. Only used by
    /// [`SearchBackend::KdTree`].
    pub leaf_size: usize,

    /// Number of trailing output columns when inputs and outputs are passed as a
    /// single combined matrix. Ignored when they are passed separately.
    pub output_dim: usize,
}

impl Default for MwlsSettings {
    fn default() -> Self {
        MwlsSettings::builder(SearchBackend::default()).build()
    }
}

impl MwlsSettings {
    /// Returns a new [`MwlsSettingsBuilder`] for the given backend.
    pub fn builder(backend: SearchBackend) -> MwlsSettingsBuilder {
        MwlsSettingsBuilder::new(backend)
    }
}

/// A convenience builder for constructing a [`MwlsSettings`] instance.
///
/// The builder should be called via the [`MwlsSettings::builder`] method.
///
/// See [`MwlsSettings`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct MwlsSettingsBuilder {
    pub backend: SearchBackend,
    pub max_degree: usize,
    pub leaf_size: usize,
    pub output_dim: usize,
}

impl MwlsSettingsBuilder {
    /// Creates a new builder with default values for the given backend.
    fn new(backend: SearchBackend) -> Self {
        Self {
            backend,
            max_degree: 2,
            leaf_size: 10,
            output_dim: 1,
        }
    }

    /// Sets the maximum polynomial degree.
    pub fn max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = max_degree;
        self
    }

    /// Sets the k-d tree leaf size.
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Sets the number of output columns of a combined sample matrix.
    pub fn output_dim(mut self, output_dim: usize) -> Self {
        self.output_dim = output_dim;
        self
    }

    /// Builds and returns a [`MwlsSettings`] instance.
    ///
    /// Values are validated when the approximator is built.
    pub fn build(self) -> MwlsSettings {
        MwlsSettings {
            backend: self.backend,
            max_degree: self.max_degree,
            leaf_size: self.leaf_size,
            output_dim: self.output_dim,
        }
    }
}
