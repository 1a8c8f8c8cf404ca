/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the weight function contract and the trait for building kernels from parameters.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::kernel_helpers::WeightParams;

/// Scores the influence of a sample on a local fit from its distance to the query point.
///
/// Implementors map `(distance, cutoff)` to a non-negative weight. For the fit to
/// actually be *moving*, the weight should vanish (or be treated as vanishing) for
/// `distance > cutoff`; no other shape constraint is imposed.
///
/// Any closure of the form `Fn(f64, f64) -> f64 + Send + Sync` is a weight function:
///
/// ```
/// use ferreus_mwls_utils::WeightFunction;
///
/// let theta = |d: f64, _cutoff: f64| (-d * d).exp();
/// assert_eq!(theta.weight(0.0, 0.5), 1.0);
/// ```
pub trait WeightFunction: Send + Sync {
    fn weight(&self, distance: f64, cutoff: f64) -> f64;
}

impl<F> WeightFunction for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    #[inline(always)]
    fn weight(&self, distance: f64, cutoff: f64) -> f64 {
        self(distance, cutoff)
    }
}

/// Converts a shared [`WeightParams`] configuration into a concrete kernel type.
pub trait WeightFromParams: Sized {
    /// Constructs `Self` from a set of uniform kernel parameters.
    fn from_params(p: &WeightParams) -> Self;
}
