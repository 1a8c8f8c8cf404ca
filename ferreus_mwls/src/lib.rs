/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for moving weighted least squares approximation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Moving Weighted Least Squares (MWLS) approximation of scattered data.
//!
//! MWLS approximates a scalar or vector valued function known only at
//! scattered sample points. At every query point a low degree polynomial is
//! fitted to the nearby samples, each weighted by a function of its distance
//! to the query, and the fitted polynomial (or one of its derivatives) is
//! evaluated at the query point. Samples further away than the cutoff distance
//! do not take part, so every query only costs a local solve.
//!
//! The samples "nearby" a query are found by one of three interchangeable
//! range search backends, selected with [`config::SearchBackend`]:
//!
//! - a balanced k-d tree with bucketed leaves (the default),
//! - a uniform grid cell linked list with cells the size of the cutoff,
//! - a brute force scan.
//!
//! All three return exactly the same samples; they only differ in cost.
//!
//! # Features
//! - Any number of input dimensions and output values per sample
//! - Arbitrary weight functions, either closures or the kernels in
//!   [`ferreus_mwls_utils::kernels`]
//! - Partial derivatives of any order from the same local fit
//! - Per query search distance overrides
//! - Parallel batch evaluation with [`rayon`](https://docs.rs/rayon)
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for linear algebra
//!
//! # Examples
//!
//! ```
//! use ferreus_mwls::{
//!     MwlsApproximator,
//!     config::{MwlsSettings, SearchBackend},
//!     generate_random_points,
//!     MwlsTestFunctions,
//! };
//! use ferreus_mwls_utils::{WeightKernelType, WeightParams};
//!
//! // Generate some random data in the unit square
//! let points = generate_random_points(400, 2, Some(42));
//!
//! // Assign values to the points using a quadratic surface
//! let point_values = MwlsTestFunctions::quadratic_2d(&points);
//!
//! // Wendland weights vanish smoothly at the cutoff
//! let weight = WeightParams::builder(WeightKernelType::Wendland)
//!     .build()
//!     .into_weight_function();
//!
//! let settings = MwlsSettings::builder(SearchBackend::CellLinkedList)
//!     .max_degree(2)
//!     .build();
//!
//! let mwls = MwlsApproximator::builder(points, point_values, 0.2, weight)
//!     .settings(settings)
//!     .build()
//!     .unwrap();
//!
//! // A degree 2 fit reproduces a quadratic surface
//! let value = mwls.evaluate_point(&[0.5, 0.5], None).unwrap();
//! let expected = 1.0 + 2.0 * 0.5 - 0.5 + 0.5 * 0.25 + 0.25 - 3.0 * 0.25;
//! assert!((value[0] - expected).abs() < 1e-8);
//!
//! // d/dx at the same point
//! let slope = mwls.differentiate_point(&[0.5, 0.5], [1, 0], None).unwrap();
//! assert!((slope[0] - 3.0).abs() < 1e-8);
//! ```
//!
//! # References
//! 1.  P. Lancaster and K. Salkauskas. Surfaces generated by moving least squares
//!     methods. Mathematics of Computation, 37(155):141–158, 1981.
//! 2.  H. Wendland. Scattered Data Approximation. Cambridge University Press, 2004.
pub mod config;

mod common;

mod mwls;

pub mod polynomials;

pub mod range_search;

mod solver;

pub mod progress;

mod mwls_test_functions;

pub use {
    common::{create_evaluation_grid, generate_random_points},
    config::{MwlsSettings, MwlsSettingsBuilder, SearchBackend},
    mwls::{MwlsApproximator, MwlsApproximatorBuilder, MwlsError, MwlsResult},
    mwls_test_functions::MwlsTestFunctions,
    polynomials::{DerivativeOrders, PolynomialBasis},
    solver::{FitOutcome, LocalFit},
};
