/////////////////////////////////////////////////////////////////////////////////////////////
//
// Assembles and solves the weighted normal equations of a single local MWLS fit.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # solver
//!
//! One local fit: given a query point and the samples around it, find the
//! polynomial `p` minimising `Σ w(|x_i - q|) |p(x_i) - y_i|²`.
//!
//! The polynomial is expressed in offsets from the query, `x - q`, so its
//! constant coefficient is the approximated value and the coefficient of a
//! monomial `(x - q)^α` is `∂^α f(q) / α!`. Before assembly the offsets are
//! divided by the distance to the farthest neighbour, which keeps every monomial
//! within `[-1, 1]`; the coefficients are rescaled afterwards.

use crate::{
    mwls::{MwlsError, MwlsResult},
    polynomials::PolynomialBasis,
};
use faer::{linalg::solvers::Solve, Mat};
use ferreus_mwls_utils::{get_distance_to_row, WeightFunction};

/// Relative threshold on the diagonal of the pivoted R factor below which a
/// column counts as linearly dependent.
const RANK_TOLERANCE: f64 = 1E-10;

/// Result of a single local fit.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// `(basis_size, output_dim)` coefficients over the query centred basis.
    pub coefficients: Mat<f64>,

    /// `true` when the system was singular and `coefficients` is the zero matrix.
    pub singular: bool,
}

impl FitOutcome {
    fn singular(basis_size: usize, output_dim: usize) -> Self {
        Self {
            coefficients: Mat::zeros(basis_size, output_dim),
            singular: true,
        }
    }
}

/// Borrowed view of everything a local fit needs apart from the query itself.
pub struct LocalFit<'a> {
    points: &'a Mat<f64>,
    values: &'a Mat<f64>,
    basis: &'a PolynomialBasis,
    weight: &'a dyn WeightFunction,
}

impl<'a> LocalFit<'a> {
    pub fn new(
        points: &'a Mat<f64>,
        values: &'a Mat<f64>,
        basis: &'a PolynomialBasis,
        weight: &'a dyn WeightFunction,
    ) -> Self {
        Self {
            points,
            values,
            basis,
            weight,
        }
    }

    /// Fits the local polynomial at `query` to the samples `neighbours`.
    ///
    /// Weights are evaluated as `weight(distance, cutoff)`.
    ///
    /// # Errors
    /// [`MwlsError::InsufficientNeighbours`] when `neighbours` is empty.
    ///
    /// A rank deficient, all zero, or non-finite system is not an error: the
    /// returned outcome then holds zero coefficients and `singular == true`.
    pub fn fit(&self, query: &[f64], neighbours: &[usize], cutoff: f64) -> MwlsResult<FitOutcome> {
        if neighbours.is_empty() {
            return Err(MwlsError::InsufficientNeighbours { radius: cutoff });
        }

        let num_neighbours = neighbours.len();
        let basis_size = self.basis.size();
        let output_dim = self.values.ncols();

        if num_neighbours < basis_size {
            return Ok(FitOutcome::singular(basis_size, output_dim));
        }

        let distances: Vec<f64> = neighbours
            .iter()
            .map(|&i| get_distance_to_row(query, self.points, i))
            .collect();

        let scale = distances.iter().cloned().fold(0.0, f64::max);
        let scale = if scale > 0.0 && scale.is_finite() { scale } else { 1.0 };

        // Rows of sqrt(w) * b(u) and sqrt(w) * y, with u = (x - q) / scale.
        let mut weighted_monomials = Mat::<f64>::zeros(num_neighbours, basis_size);
        let mut weighted_values = Mat::<f64>::zeros(num_neighbours, output_dim);
        let mut offset = vec![0.0; query.len()];

        for (row, (&i, &dist)) in neighbours.iter().zip(distances.iter()).enumerate() {
            let w = self.weight.weight(dist, cutoff);
            if !(w >= 0.0) || !w.is_finite() {
                return Ok(FitOutcome::singular(basis_size, output_dim));
            }
            let sqrt_w = w.sqrt();

            offset
                .iter_mut()
                .enumerate()
                .for_each(|(k, u)| *u = (self.points[(i, k)] - query[k]) / scale);

            for (col, b) in self.basis.evaluate(&offset).into_iter().enumerate() {
                weighted_monomials[(row, col)] = sqrt_w * b;
            }
            for col in 0..output_dim {
                weighted_values[(row, col)] = sqrt_w * self.values[(i, col)];
            }
        }

        let all_finite = (0..num_neighbours).all(|row| {
            (0..output_dim).all(|col| weighted_values[(row, col)].is_finite())
        });
        if !all_finite || !is_full_rank(&weighted_monomials) {
            return Ok(FitOutcome::singular(basis_size, output_dim));
        }

        // Normal equations: (Bᵀ W B) a = Bᵀ W y
        let lhs = weighted_monomials.transpose() * &weighted_monomials;
        let rhs = weighted_monomials.transpose() * &weighted_values;

        let lu = lhs.partial_piv_lu();
        let mut coefficients = lu.solve(rhs);

        // Undo the offset scaling: a_α u^α = (a_α / scale^|α|) (x - q)^α
        for j in 0..basis_size {
            let factor = scale.powi(self.basis.degree(j) as i32);
            for col in 0..output_dim {
                coefficients[(j, col)] /= factor;
            }
        }

        let solution_finite = (0..basis_size)
            .all(|j| (0..output_dim).all(|col| coefficients[(j, col)].is_finite()));
        if !solution_finite {
            return Ok(FitOutcome::singular(basis_size, output_dim));
        }

        Ok(FitOutcome {
            coefficients,
            singular: false,
        })
    }
}

/// Whether the columns of the weighted monomial matrix are linearly independent.
fn is_full_rank(weighted_monomials: &Mat<f64>) -> bool {
    let (nrows, ncols) = weighted_monomials.shape();
    if nrows < ncols {
        return false;
    }

    let finite = (0..nrows).all(|i| (0..ncols).all(|j| weighted_monomials[(i, j)].is_finite()));
    if !finite {
        return false;
    }

    // QR with column pivoting; |R_kk| is non-increasing along the diagonal.
    let qrc = weighted_monomials.col_piv_qr();
    let rc = qrc.thin_R();

    let leading = rc.get(0, 0).abs();
    if !(leading > 0.0) {
        return false;
    }
    let thresh = RANK_TOLERANCE * leading;

    let rank = rc
        .diagonal()
        .column_vector()
        .iter()
        .filter(|val| val.abs() > thresh)
        .count();

    rank == ncols
}
