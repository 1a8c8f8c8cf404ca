/////////////////////////////////////////////////////////////////////////////////////////////
//
// Enumerates, evaluates, and differentiates the monomial basis of the local MWLS polynomials.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # polynomials
//!
//! The local polynomial of a moving least squares fit is stored as a coefficient
//! vector over a fixed monomial basis. Differentiating the polynomial is then a
//! linear map on that vector, which [`PolynomialBasis`] provides both as a
//! per-monomial mapping and as a dense matrix.

use crate::mwls::{MwlsError, MwlsResult};
use faer::Mat;
use ferreus_mwls_utils::binomial;
use itertools::Itertools;
use std::collections::HashMap;

/// Orders of a partial derivative.
///
/// A bare integer differentiates along the first axis only; a per-axis vector
/// gives the number of differentiations for every input dimension. For a 1-D
/// domain `DerivativeOrders::from(1)` and `DerivativeOrders::from([1])` are the
/// same request.
///
/// ```
/// use ferreus_mwls::DerivativeOrders;
///
/// // d/dx
/// let first = DerivativeOrders::from(1);
/// assert_eq!(first.resolve(3).unwrap(), vec![1, 0, 0]);
///
/// // d^3 / (dx dy^2)
/// let mixed = DerivativeOrders::from([1, 2]);
/// assert_eq!(mixed.resolve(2).unwrap(), vec![1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivativeOrders {
    /// Differentiate the first axis this many times.
    FirstAxis(usize),

    /// Per-axis derivative orders.
    PerAxis(Vec<usize>),
}

impl DerivativeOrders {
    /// Expands the orders into one entry per input dimension.
    ///
    /// Fails with [`MwlsError::DimensionMismatch`] if a per-axis tuple does not
    /// have `dimensions` entries.
    pub fn resolve(&self, dimensions: usize) -> MwlsResult<Vec<usize>> {
        match self {
            DerivativeOrders::FirstAxis(order) => {
                let mut orders = vec![0; dimensions];
                if let Some(first) = orders.first_mut() {
                    *first = *order;
                }
                Ok(orders)
            }
            DerivativeOrders::PerAxis(orders) => {
                if orders.len() != dimensions {
                    return Err(MwlsError::DimensionMismatch {
                        expected: dimensions,
                        found: orders.len(),
                    });
                }
                Ok(orders.clone())
            }
        }
    }
}

impl From<usize> for DerivativeOrders {
    fn from(order: usize) -> Self {
        DerivativeOrders::FirstAxis(order)
    }
}

impl From<Vec<usize>> for DerivativeOrders {
    fn from(orders: Vec<usize>) -> Self {
        DerivativeOrders::PerAxis(orders)
    }
}

impl From<&[usize]> for DerivativeOrders {
    fn from(orders: &[usize]) -> Self {
        DerivativeOrders::PerAxis(orders.to_vec())
    }
}

impl<const K: usize> From<[usize; K]> for DerivativeOrders {
    fn from(orders: [usize; K]) -> Self {
        DerivativeOrders::PerAxis(orders.to_vec())
    }
}

/// Monomial basis of all polynomials in `dimensions` variables with total degree
/// at most `max_degree`.
///
/// Monomials are ordered by total degree, then by non-decreasing combinations of
/// variable indices, e.g. `[1, x, y, x^2, xy, y^2]` in 2-D. The order is fixed at
/// construction, so coefficient vectors produced by a fit stay aligned with
/// every evaluation and differentiation of the same basis.
#[derive(Debug, Clone)]
pub struct PolynomialBasis {
    dimensions: usize,
    max_degree: usize,
    exponents: Vec<Vec<usize>>,
    lookup: HashMap<Vec<usize>, usize>,
}

impl PolynomialBasis {
    pub fn new(dimensions: usize, max_degree: usize) -> Self {
        let mut exponents: Vec<Vec<usize>> =
            Vec::with_capacity(binomial(dimensions + max_degree, max_degree));

        // constant term
        exponents.push(vec![0; dimensions]);

        for degree in 1..=max_degree {
            for variables in (0..dimensions).combinations_with_replacement(degree) {
                let mut exponent = vec![0; dimensions];
                variables.iter().for_each(|&v| exponent[v] += 1);
                exponents.push(exponent);
            }
        }

        let lookup = exponents
            .iter()
            .enumerate()
            .map(|(i, e)| (e.clone(), i))
            .collect();

        Self {
            dimensions,
            max_degree,
            exponents,
            lookup,
        }
    }

    /// Number of monomials, `C(dimensions + max_degree, max_degree)`.
    #[inline]
    pub fn size(&self) -> usize {
        self.exponents.len()
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[inline]
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Per-variable exponents of monomial `index`.
    #[inline]
    pub fn exponents(&self, index: usize) -> &[usize] {
        &self.exponents[index]
    }

    /// Total degree of monomial `index`.
    #[inline]
    pub fn degree(&self, index: usize) -> usize {
        self.exponents[index].iter().sum()
    }

    /// Index of the monomial with the given exponents, if it belongs to the basis.
    pub fn index_of(&self, exponents: &[usize]) -> Option<usize> {
        self.lookup.get(exponents).copied()
    }

    /// Powers `x_k^e` for every axis `k` and `e <= max_degree`.
    fn axis_powers(&self, point: &[f64]) -> Vec<Vec<f64>> {
        point
            .iter()
            .map(|&x| {
                let mut powers = Vec::with_capacity(self.max_degree + 1);
                let mut p = 1.0;
                for _ in 0..=self.max_degree {
                    powers.push(p);
                    p *= x;
                }
                powers
            })
            .collect()
    }

    #[inline]
    fn monomial_value(exponent: &[usize], powers: &[Vec<f64>]) -> f64 {
        exponent
            .iter()
            .zip(powers.iter())
            .fold(1.0, |acc, (&e, p)| acc * p[e])
    }

    /// Evaluates every monomial at `point`.
    pub fn evaluate(&self, point: &[f64]) -> Vec<f64> {
        debug_assert_eq!(point.len(), self.dimensions);
        let powers = self.axis_powers(point);
        self.exponents
            .iter()
            .map(|e| Self::monomial_value(e, &powers))
            .collect()
    }

    /// Evaluates every monomial at every row of `points`.
    ///
    /// Returns a `(points.nrows(), self.size())` matrix.
    pub fn evaluate_monomials(&self, points: &Mat<f64>) -> Mat<f64> {
        let (n, d) = points.shape();
        debug_assert_eq!(d, self.dimensions);

        let mut monomials = Mat::<f64>::zeros(n, self.size());
        let mut point = vec![0.0; d];

        for i in 0..n {
            point
                .iter_mut()
                .enumerate()
                .for_each(|(k, x)| *x = points[(i, k)]);

            let powers = self.axis_powers(&point);
            for (j, e) in self.exponents.iter().enumerate() {
                monomials[(i, j)] = Self::monomial_value(e, &powers);
            }
        }

        monomials
    }

    /// Differentiates every monomial `orders[k]` times along axis `k`.
    ///
    /// Entry `i` of the result is `Some((c, j))` when the derivative of monomial
    /// `i` equals `c` times monomial `j`, and `None` when it vanishes, i.e. when
    /// some axis is differentiated more often than the monomial's exponent on it.
    pub fn differentiate(&self, orders: &[usize]) -> Vec<Option<(f64, usize)>> {
        debug_assert_eq!(orders.len(), self.dimensions);

        self.exponents
            .iter()
            .map(|exponent| {
                let mut coefficient = 1.0;
                let mut reduced = Vec::with_capacity(self.dimensions);

                for (&e, &o) in exponent.iter().zip(orders.iter()) {
                    if o > e {
                        return None;
                    }
                    // falling factorial e (e - 1) ... (e - o + 1)
                    coefficient *= ((e - o + 1)..=e).map(|f| f as f64).product::<f64>();
                    reduced.push(e - o);
                }

                self.index_of(&reduced).map(|j| (coefficient, j))
            })
            .collect()
    }

    /// Evaluates the differentiated basis at `point`.
    ///
    /// Entry `i` is the value of the derivative of monomial `i`, so the dot
    /// product with a coefficient vector is the derivative of that polynomial.
    pub fn evaluate_derivative(&self, point: &[f64], orders: &[usize]) -> Vec<f64> {
        let values = self.evaluate(point);
        self.differentiate(orders)
            .into_iter()
            .map(|term| match term {
                Some((c, j)) => c * values[j],
                None => 0.0,
            })
            .collect()
    }

    /// Matrix of the differentiation operator on coefficient vectors.
    ///
    /// For a polynomial with coefficients `c`, `D * c` holds the coefficients of
    /// its derivative over the same basis.
    pub fn differentiation_matrix(&self, orders: &[usize]) -> Mat<f64> {
        let size = self.size();
        let mut d = Mat::<f64>::zeros(size, size);

        self.differentiate(orders)
            .into_iter()
            .enumerate()
            .for_each(|(i, term)| {
                if let Some((c, j)) = term {
                    d[(j, i)] = c;
                }
            });

        d
    }
}
