/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete distance-decaying weight kernels used by the MWLS fit.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{WeightFromParams, WeightFunction, WeightParams};

/// Gaussian weight `theta(d) = exp(-(d / shape)^2)`, truncated at the cutoff.
///
/// A good choice for `shape` is the average spacing of the sample data.
#[derive(Clone, Debug, Copy)]
pub struct GaussianWeight {
    pub shape: f64,
}

impl GaussianWeight {
    #[inline(always)]
    pub fn new(shape: f64) -> Self {
        Self { shape }
    }

    #[inline(always)]
    pub fn theta(&self, d: f64) -> f64 {
        let s = d / self.shape;
        (-s * s).exp()
    }
}

impl WeightFunction for GaussianWeight {
    #[inline(always)]
    fn weight(&self, distance: f64, cutoff: f64) -> f64 {
        match distance > cutoff {
            true => 0.0,
            false => self.theta(distance),
        }
    }
}

impl WeightFromParams for GaussianWeight {
    #[inline(always)]
    fn from_params(p: &WeightParams) -> Self {
        GaussianWeight::new(p.shape)
    }
}

/// Wendland C2 weight `theta(r) = (1 - r)^4 (4r + 1)` with `r = d / cutoff`.
///
/// Compactly supported and twice continuously differentiable, so the approximant
/// stays smooth as samples enter and leave the search window.
#[derive(Clone, Debug, Copy)]
pub struct WendlandWeight;

impl WendlandWeight {
    #[inline(always)]
    pub fn theta(&self, r: f64) -> f64 {
        let t = 1.0 - r;
        t.powi(4) * (4.0 * r + 1.0)
    }
}

impl WeightFunction for WendlandWeight {
    #[inline(always)]
    fn weight(&self, distance: f64, cutoff: f64) -> f64 {
        let r = distance / cutoff;
        match r >= 1.0 {
            true => 0.0,
            false => self.theta(r),
        }
    }
}

impl WeightFromParams for WendlandWeight {
    #[inline(always)]
    fn from_params(_: &WeightParams) -> Self {
        WendlandWeight
    }
}

/// Tricube weight `theta(r) = (1 - r^3)^3` with `r = d / cutoff`.
#[derive(Clone, Debug, Copy)]
pub struct TricubeWeight;

impl TricubeWeight {
    #[inline(always)]
    pub fn theta(&self, r: f64) -> f64 {
        let t = 1.0 - r * r * r;
        t * t * t
    }
}

impl WeightFunction for TricubeWeight {
    #[inline(always)]
    fn weight(&self, distance: f64, cutoff: f64) -> f64 {
        let r = distance / cutoff;
        match r >= 1.0 {
            true => 0.0,
            false => self.theta(r),
        }
    }
}

impl WeightFromParams for TricubeWeight {
    #[inline(always)]
    fn from_params(_: &WeightParams) -> Self {
        TricubeWeight
    }
}

/// Constant weight inside the cutoff. Reduces the method to plain local least squares.
#[derive(Clone, Debug, Copy)]
pub struct UniformWeight;

impl WeightFunction for UniformWeight {
    #[inline(always)]
    fn weight(&self, distance: f64, cutoff: f64) -> f64 {
        match distance > cutoff {
            true => 0.0,
            false => 1.0,
        }
    }
}

impl WeightFromParams for UniformWeight {
    #[inline(always)]
    fn from_params(_: &WeightParams) -> Self {
        UniformWeight
    }
}
