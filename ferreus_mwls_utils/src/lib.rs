/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports weight kernels, parameter builders, and helper functions used across the ferreus_mwls crates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`ferreus_mwls`] crate
//!
//! Holds the weight function contract used by the moving weighted least squares
//! fit, a handful of ready-made weight kernels, and small geometric helpers
//! shared by the range search backends.
mod kernel_helpers;
mod traits;
mod utils;
mod weight_kernels;

/// Implemented weight kernels for use in the [`ferreus_mwls`] crate.
pub mod kernels {
    pub use super::weight_kernels::*;
}

pub use {
    kernel_helpers::{WeightKernelType, WeightParams, WeightParamsBuilder},
    traits::{WeightFromParams, WeightFunction},
    utils::{binomial, checked_binomial, get_distance, get_distance_to_row, get_pointarray_extents},
};
