/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides test functions with known values and derivatives for validating MWLS approximation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Smooth test surfaces. Each takes one point per row and returns a single
//! value column.
use faer::Mat;

/// Struct that implements 1D and 2D functions used to generate sample values,
/// and the exact derivatives to compare approximations against.
pub struct MwlsTestFunctions;

impl MwlsTestFunctions {
    /// `sin(x)`.
    pub fn sine_1d(points: &Mat<f64>) -> Mat<f64> {
        assert_eq!(points.ncols(), 1);
        Mat::from_fn(points.nrows(), 1, |i, _| points[(i, 0)].sin())
    }

    /// `cos(x)`, the derivative of [`MwlsTestFunctions::sine_1d`].
    pub fn sine_1d_derivative(points: &Mat<f64>) -> Mat<f64> {
        assert_eq!(points.ncols(), 1);
        Mat::from_fn(points.nrows(), 1, |i, _| points[(i, 0)].cos())
    }

    /// Franke's two-dimensional test function:
    ///
    /// ```text
    /// F(x, y) = 3/4 exp(-((9x - 2)^2 + (9y - 2)^2) / 4)
    ///         + 3/4 exp(-(9x + 1)^2 / 49 - (9y + 1)^2 / 10)
    ///         + 1/2 exp(-((9x - 7)^2 + (9y - 3)^2) / 4)
    ///         - 1/5 exp(-(9x - 4)^2 - (9y - 7)^2)
    /// ```
    pub fn franke_2d(points: &Mat<f64>) -> Mat<f64> {
        assert_eq!(points.ncols(), 2);

        Mat::from_fn(points.nrows(), 1, |i, _| {
            let (x, y) = (points[(i, 0)], points[(i, 1)]);
            Self::franke_terms(x, y).iter().map(|(v, _, _)| v).sum::<f64>()
        })
    }

    /// Gradient of [`MwlsTestFunctions::franke_2d`], one `(dF/dx, dF/dy)` row per point.
    pub fn franke_2d_gradient(points: &Mat<f64>) -> Mat<f64> {
        assert_eq!(points.ncols(), 2);

        Mat::from_fn(points.nrows(), 2, |i, j| {
            let (x, y) = (points[(i, 0)], points[(i, 1)]);
            Self::franke_terms(x, y)
                .iter()
                .map(|(_, dx, dy)| if j == 0 { dx } else { dy })
                .sum::<f64>()
        })
    }

    /// Value and partial derivatives of each of the four Franke terms.
    fn franke_terms(x: f64, y: f64) -> [(f64, f64, f64); 4] {
        let (nx, ny) = (9.0 * x, 9.0 * y);

        // (scale, x centre, y centre, x divisor, y divisor)
        let terms = [
            (0.75, 2.0, 2.0, 4.0, 4.0),
            (0.75, -1.0, -1.0, 49.0, 10.0),
            (0.5, 7.0, 3.0, 4.0, 4.0),
            (-0.2, 4.0, 7.0, 1.0, 1.0),
        ];

        terms.map(|(scale, cx, cy, sx, sy)| {
            let (dx, dy) = (nx - cx, ny - cy);
            let value = scale * (-(dx * dx) / sx - (dy * dy) / sy).exp();
            // chain rule through 9x and 9y
            (value, value * (-2.0 * dx / sx) * 9.0, value * (-2.0 * dy / sy) * 9.0)
        })
    }

    /// `1 + 2x - y + x^2/2 + xy - 3y^2`, a full quadratic in two variables.
    pub fn quadratic_2d(points: &Mat<f64>) -> Mat<f64> {
        assert_eq!(points.ncols(), 2);

        Mat::from_fn(points.nrows(), 1, |i, _| {
            let (x, y) = (points[(i, 0)], points[(i, 1)]);
            1.0 + 2.0 * x - y + 0.5 * x * x + x * y - 3.0 * y * y
        })
    }

    /// Gradient of [`MwlsTestFunctions::quadratic_2d`], one `(dF/dx, dF/dy)` row per point.
    pub fn quadratic_2d_gradient(points: &Mat<f64>) -> Mat<f64> {
        assert_eq!(points.ncols(), 2);

        Mat::from_fn(points.nrows(), 2, |i, j| {
            let (x, y) = (points[(i, 0)], points[(i, 1)]);
            match j {
                0 => 2.0 + x + y,
                _ => -1.0 + x - 6.0 * y,
            }
        })
    }
}
