/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides parameter and builder types for configuring MWLS weight kernels.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    kernels::{GaussianWeight, TricubeWeight, UniformWeight, WendlandWeight},
    WeightFromParams, WeightFunction,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The implemented weight kernels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WeightKernelType {
    /// `exp(-(d / shape)^2)`, truncated at the cutoff.
    Gaussian,

    /// Wendland C2, `(1 - r)^4 (4r + 1)` with `r = d / cutoff`.
    Wendland,

    /// `(1 - r^3)^3` with `r = d / cutoff`.
    Tricube,

    /// `1` inside the cutoff.
    Uniform,
}

/// Defines the [`WeightKernelType`] to use, along with the shape
/// parameter for kernels that have one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightParams {
    /// WeightKernelType enum variant to use.
    pub kernel_type: WeightKernelType,

    /// Length scale of the kernel. Typically the average spacing of the samples.
    ///
    /// Only used by the Gaussian kernel.
    pub shape: f64,
}

impl WeightParams {
    /// Begins building a [`WeightParams`] instance for the given kernel type.
    pub fn builder(kernel_type: WeightKernelType) -> WeightParamsBuilder {
        WeightParamsBuilder {
            kernel_type,
            shape: 1.0,
        }
    }

    /// Returns the configured kernel as a shareable weight function.
    pub fn into_weight_function(self) -> Arc<dyn WeightFunction> {
        match self.kernel_type {
            WeightKernelType::Gaussian => Arc::new(GaussianWeight::from_params(&self)),
            WeightKernelType::Wendland => Arc::new(WendlandWeight::from_params(&self)),
            WeightKernelType::Tricube => Arc::new(TricubeWeight::from_params(&self)),
            WeightKernelType::Uniform => Arc::new(UniformWeight::from_params(&self)),
        }
    }
}

/// Builder for [`WeightParams`] that provides sensible defaults.
#[derive(Debug, Clone, Copy)]
pub struct WeightParamsBuilder {
    kernel_type: WeightKernelType,
    shape: f64,
}

impl WeightParamsBuilder {
    /// Sets the `shape` parameter on the builder.
    pub fn shape(mut self, v: f64) -> Self {
        self.shape = v;
        self
    }

    /// Finalises the builder into a [`WeightParams`] value.
    pub fn build(self) -> WeightParams {
        assert!(self.shape > 0.0, "Weight kernel shape must be positive");
        WeightParams {
            kernel_type: self.kernel_type,
            shape: self.shape,
        }
    }
}
