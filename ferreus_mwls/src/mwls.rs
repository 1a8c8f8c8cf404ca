/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the MWLS approximator, its builder, error type, and point and batch query logic.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    common::split_combined_samples,
    config::{MwlsSettings, SearchBackend},
    polynomials::{DerivativeOrders, PolynomialBasis},
    progress::{ProgressMsg, ProgressSink},
    range_search::{NeighbourSearch, RangeSearch},
    solver::{FitOutcome, LocalFit},
};
use faer::Mat;
use ferreus_mwls_utils::{checked_binomial, WeightFunction};
use rayon::prelude::*;
use std::{error::Error, fmt, sync::Arc, time::Instant};

/// Errors raised while building or querying an [`MwlsApproximator`].
///
/// A singular local system is not an error; it yields zero coefficients.
#[derive(Debug, Clone, PartialEq)]
pub enum MwlsError {
    /// No samples were supplied.
    EmptySampleSet,

    /// A query point or derivative order tuple has the wrong number of entries.
    DimensionMismatch { expected: usize, found: usize },

    /// Point and value matrices have different numbers of rows.
    SampleCountMismatch { points: usize, values: usize },

    /// The cutoff distance is not positive and finite.
    InvalidCutoff { cutoff: f64 },

    /// The settings are inconsistent with each other or with the samples.
    InvalidConfiguration { reason: String },

    /// No sample lies within `radius` of the query point.
    InsufficientNeighbours { radius: f64 },
}

impl fmt::Display for MwlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MwlsError::EmptySampleSet => write!(f, "sample set is empty"),
            MwlsError::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            MwlsError::SampleCountMismatch { points, values } => write!(
                f,
                "sample count mismatch: {points} points but {values} values"
            ),
            MwlsError::InvalidCutoff { cutoff } => {
                write!(f, "cutoff distance must be positive and finite, got {cutoff}")
            }
            MwlsError::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
            MwlsError::InsufficientNeighbours { radius } => {
                write!(f, "no samples within distance {radius} of the query point")
            }
        }
    }
}

impl Error for MwlsError {}

/// Result type returned by MWLS operations.
pub type MwlsResult<T> = Result<T, MwlsError>;

/// Where the builder gets its samples from.
enum SampleSource {
    Separate { points: Mat<f64>, point_values: Mat<f64> },
    Combined { samples: Mat<f64> },
}

/// Convenience builder for constructing an [`MwlsApproximator`].
///
/// The builder should be called via [`MwlsApproximator::builder`] or
/// [`MwlsApproximatorBuilder::from_combined`].
///
/// See [`MwlsApproximator`] for details on each field.
pub struct MwlsApproximatorBuilder {
    source: SampleSource,
    cutoff: f64,
    weight: Arc<dyn WeightFunction>,
    settings: MwlsSettings,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl MwlsApproximatorBuilder {
    fn new(source: SampleSource, cutoff: f64, weight: Arc<dyn WeightFunction>) -> Self {
        Self {
            source,
            cutoff,
            weight,
            settings: MwlsSettings::default(),
            progress_callback: None,
        }
    }

    /// Starts a builder from a single `(N, n + m)` matrix whose trailing
    /// [`MwlsSettings::output_dim`] columns hold the sample values.
    ///
    /// The split happens in [`MwlsApproximatorBuilder::build`], after the
    /// settings are known.
    pub fn from_combined(samples: Mat<f64>, cutoff: f64, weight: Arc<dyn WeightFunction>) -> Self {
        Self::new(SampleSource::Combined { samples }, cutoff, weight)
    }

    /// Sets the backend, polynomial degree, and other settings.
    pub fn settings(mut self, settings: MwlsSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Optional callback for reporting construction and query events.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Validates the inputs, builds the range search backend and returns the
    /// configured [`MwlsApproximator`].
    ///
    /// # Errors
    /// - [`MwlsError::InvalidCutoff`] if the cutoff is not positive and finite.
    /// - [`MwlsError::InvalidConfiguration`] for a zero leaf size or output
    ///   dimension, a combined matrix without input columns, points without
    ///   coordinates, non-finite samples, or fewer samples than polynomial
    ///   basis terms.
    /// - [`MwlsError::SampleCountMismatch`] if points and values differ in length.
    /// - [`MwlsError::EmptySampleSet`] if there are no samples.
    pub fn build(self) -> MwlsResult<MwlsApproximator> {
        let settings = self.settings;

        if !(self.cutoff > 0.0) || !self.cutoff.is_finite() {
            return Err(MwlsError::InvalidCutoff { cutoff: self.cutoff });
        }
        if settings.leaf_size == 0 {
            return Err(invalid("leaf_size must be at least 1"));
        }
        if settings.output_dim == 0 {
            return Err(invalid("output_dim must be at least 1"));
        }

        let (points, point_values) = match self.source {
            SampleSource::Separate {
                points,
                point_values,
            } => (points, point_values),
            SampleSource::Combined { samples } => {
                if samples.ncols() <= settings.output_dim {
                    return Err(invalid(format!(
                        "combined samples have {} columns, need more than output_dim = {}",
                        samples.ncols(),
                        settings.output_dim
                    )));
                }
                split_combined_samples(&samples, settings.output_dim)
            }
        };

        if points.nrows() != point_values.nrows() {
            return Err(MwlsError::SampleCountMismatch {
                points: points.nrows(),
                values: point_values.nrows(),
            });
        }
        if points.nrows() == 0 {
            return Err(MwlsError::EmptySampleSet);
        }
        if points.ncols() == 0 {
            return Err(invalid("sample points must have at least one coordinate"));
        }
        if point_values.ncols() == 0 {
            return Err(invalid("sample values must have at least one column"));
        }

        if !all_finite(&points) {
            return Err(invalid("sample points must be finite"));
        }
        if !all_finite(&point_values) {
            return Err(invalid("sample values must be finite"));
        }

        let basis_size = points
            .ncols()
            .checked_add(settings.max_degree)
            .and_then(|n| checked_binomial(n, settings.max_degree))
            .ok_or_else(|| {
                invalid(format!(
                    "degree {} has too many basis terms in {} dimensions",
                    settings.max_degree,
                    points.ncols()
                ))
            })?;
        if basis_size > points.nrows() {
            return Err(invalid(format!(
                "degree {} needs at least {} samples in {} dimensions, got {}",
                settings.max_degree,
                basis_size,
                points.ncols(),
                points.nrows()
            )));
        }

        Ok(MwlsApproximator::new(
            points,
            point_values,
            self.cutoff,
            self.weight,
            settings,
            self.progress_callback,
        ))
    }
}

fn all_finite(m: &Mat<f64>) -> bool {
    (0..m.ncols()).all(|j| (0..m.nrows()).all(|i| m[(i, j)].is_finite()))
}

fn invalid(reason: impl Into<String>) -> MwlsError {
    MwlsError::InvalidConfiguration {
        reason: reason.into(),
    }
}

/// Moving weighted least squares approximation of scattered samples.
///
/// Construction builds the selected range search backend once. Every query
/// then gathers the samples within the search distance (the cutoff unless
/// overridden), fits a weighted least squares polynomial of degree
/// `settings.max_degree` around the query point, and reads the value or a
/// derivative off the fitted polynomial.
///
/// The approximator is immutable after construction and all queries take
/// `&self`, so it can be shared freely between threads.
///
/// # Example
/// ```
/// use faer::Mat;
/// use ferreus_mwls::MwlsApproximator;
/// use std::sync::Arc;
///
/// let xs = Mat::from_fn(41, 1, |i, _| -2.0 + 0.1 * i as f64);
/// let fs = Mat::from_fn(41, 1, |i, _| xs[(i, 0)].sin());
/// let theta = Arc::new(|d: f64, _cutoff: f64| (-d * d).exp());
///
/// let approximator = MwlsApproximator::kd_tree(xs, fs, 0.5, theta).unwrap();
///
/// let value = approximator.evaluate_point(&[1.0], None).unwrap();
/// assert!((value[0] - 1f64.sin()).abs() < 1e-3);
/// ```
pub struct MwlsApproximator {
    /// Coordinates of the samples, one per row.
    points: Arc<Mat<f64>>,

    /// Values at each sample, one row per sample.
    point_values: Mat<f64>,

    /// Default search radius, passed to the weight function as its cutoff.
    cutoff: f64,

    weight: Arc<dyn WeightFunction>,

    settings: MwlsSettings,

    basis: PolynomialBasis,

    search: NeighbourSearch,

    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl fmt::Debug for MwlsApproximator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MwlsApproximator")
            .field("num_points", &self.num_points())
            .field("dimensions", &self.dimensions())
            .field("output_dim", &self.output_dim())
            .field("cutoff", &self.cutoff)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl MwlsApproximator {
    /// Creates a new [`MwlsApproximatorBuilder`] for separate point and value matrices.
    ///
    /// This is the way to construct an approximator with non-default settings.
    pub fn builder(
        points: Mat<f64>,
        point_values: Mat<f64>,
        cutoff: f64,
        weight: Arc<dyn WeightFunction>,
    ) -> MwlsApproximatorBuilder {
        MwlsApproximatorBuilder::new(
            SampleSource::Separate {
                points,
                point_values,
            },
            cutoff,
            weight,
        )
    }

    /// Builds an approximator backed by a k-d tree, with default settings otherwise.
    pub fn kd_tree(
        points: Mat<f64>,
        point_values: Mat<f64>,
        cutoff: f64,
        weight: Arc<dyn WeightFunction>,
    ) -> MwlsResult<Self> {
        Self::with_backend(points, point_values, cutoff, weight, SearchBackend::KdTree)
    }

    /// Builds an approximator backed by a cell linked list, with default settings otherwise.
    pub fn cell_linked_list(
        points: Mat<f64>,
        point_values: Mat<f64>,
        cutoff: f64,
        weight: Arc<dyn WeightFunction>,
    ) -> MwlsResult<Self> {
        Self::with_backend(
            points,
            point_values,
            cutoff,
            weight,
            SearchBackend::CellLinkedList,
        )
    }

    /// Builds an approximator that scans every sample, with default settings otherwise.
    pub fn naive(
        points: Mat<f64>,
        point_values: Mat<f64>,
        cutoff: f64,
        weight: Arc<dyn WeightFunction>,
    ) -> MwlsResult<Self> {
        Self::with_backend(points, point_values, cutoff, weight, SearchBackend::Naive)
    }

    fn with_backend(
        points: Mat<f64>,
        point_values: Mat<f64>,
        cutoff: f64,
        weight: Arc<dyn WeightFunction>,
        backend: SearchBackend,
    ) -> MwlsResult<Self> {
        Self::builder(points, point_values, cutoff, weight)
            .settings(MwlsSettings::builder(backend).build())
            .build()
    }

    fn new(
        points: Mat<f64>,
        point_values: Mat<f64>,
        cutoff: f64,
        weight: Arc<dyn WeightFunction>,
        settings: MwlsSettings,
        progress_callback: Option<Arc<dyn ProgressSink>>,
    ) -> Self {
        let build_start = Instant::now();

        let points = Arc::new(points);
        let basis = PolynomialBasis::new(points.ncols(), settings.max_degree);
        let search = NeighbourSearch::build(points.clone(), cutoff, &settings);

        if let Some(sink) = &progress_callback {
            sink.emit(ProgressMsg::BackendBuilt {
                backend: search.backend(),
                num_points: points.nrows(),
                elapsed: build_start.elapsed(),
            });
        }

        Self {
            points,
            point_values,
            cutoff,
            weight,
            settings,
            basis,
            search,
            progress_callback,
        }
    }

    /// Number of input coordinates per sample.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.points.ncols()
    }

    /// Number of values per sample.
    #[inline]
    pub fn output_dim(&self) -> usize {
        self.point_values.ncols()
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.nrows()
    }

    #[inline]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    #[inline]
    pub fn settings(&self) -> &MwlsSettings {
        &self.settings
    }

    /// Monomial basis the coefficient matrices are expressed in.
    #[inline]
    pub fn basis(&self) -> &PolynomialBasis {
        &self.basis
    }

    #[inline]
    pub fn backend(&self) -> SearchBackend {
        self.search.backend()
    }

    #[inline]
    pub fn points(&self) -> &Mat<f64> {
        &self.points
    }

    #[inline]
    pub fn point_values(&self) -> &Mat<f64> {
        &self.point_values
    }

    fn check_point(&self, point: &[f64]) -> MwlsResult<()> {
        if point.len() != self.dimensions() {
            return Err(MwlsError::DimensionMismatch {
                expected: self.dimensions(),
                found: point.len(),
            });
        }
        Ok(())
    }

    #[inline]
    fn radius(&self, distance: Option<f64>) -> f64 {
        distance.unwrap_or(self.cutoff)
    }

    /// Indices of the samples within `distance` (default: the cutoff) of
    /// `point`, sorted ascending.
    pub fn neighbours(&self, point: &[f64], distance: Option<f64>) -> MwlsResult<Vec<usize>> {
        self.check_point(point)?;
        Ok(self.search.neighbours(point, self.radius(distance)))
    }

    /// Fits the local polynomial at `point`.
    fn fit(&self, point: &[f64], distance: Option<f64>) -> MwlsResult<FitOutcome> {
        self.check_point(point)?;

        let radius = self.radius(distance);
        let neighbours = self.search.neighbours(point, radius);

        let outcome = LocalFit::new(
            &self.points,
            &self.point_values,
            &self.basis,
            self.weight.as_ref(),
        )
        .fit(point, &neighbours, radius)?;

        if outcome.singular {
            if let Some(sink) = &self.progress_callback {
                sink.emit(ProgressMsg::SingularSystem {
                    point: point.to_vec(),
                });
            }
        }

        Ok(outcome)
    }

    /// Coefficients of the local polynomial fitted at `point`.
    ///
    /// Returns a `(basis().size(), output_dim())` matrix over the monomials of
    /// [`MwlsApproximator::basis`] in the offset `x - point`. The matrix is all
    /// zeros when the local system is singular.
    ///
    /// # Errors
    /// - [`MwlsError::DimensionMismatch`] if `point` has the wrong length.
    /// - [`MwlsError::InsufficientNeighbours`] if no sample is within range.
    pub fn coefficients(&self, point: &[f64], distance: Option<f64>) -> MwlsResult<Mat<f64>> {
        Ok(self.fit(point, distance)?.coefficients)
    }

    /// Approximated value at `point`, one entry per output dimension.
    ///
    /// `distance` overrides the search radius for this query only.
    ///
    /// # Errors
    /// - [`MwlsError::DimensionMismatch`] if `point` has the wrong length.
    /// - [`MwlsError::InsufficientNeighbours`] if no sample is within range.
    pub fn evaluate_point(&self, point: &[f64], distance: Option<f64>) -> MwlsResult<Vec<f64>> {
        let coefficients = self.coefficients(point, distance)?;

        // The local basis at zero offset is 1 for the constant term and 0 otherwise.
        Ok((0..self.output_dim())
            .map(|j| coefficients[(0, j)])
            .collect())
    }

    /// Partial derivative of the approximation at `point`.
    ///
    /// `orders` is either a bare integer, differentiating along the first axis,
    /// or one order per axis.
    ///
    /// # Errors
    /// - [`MwlsError::DimensionMismatch`] if `point` or `orders` has the wrong length.
    /// - [`MwlsError::InsufficientNeighbours`] if no sample is within range.
    pub fn differentiate_point(
        &self,
        point: &[f64],
        orders: impl Into<DerivativeOrders>,
        distance: Option<f64>,
    ) -> MwlsResult<Vec<f64>> {
        self.check_point(point)?;
        let orders = orders.into().resolve(self.dimensions())?;

        let coefficients = self.coefficients(point, distance)?;
        let derivative_basis = self
            .basis
            .evaluate_derivative(&vec![0.0; self.dimensions()], &orders);

        Ok((0..self.output_dim())
            .map(|j| {
                derivative_basis
                    .iter()
                    .enumerate()
                    .map(|(i, b)| b * coefficients[(i, j)])
                    .sum::<f64>()
            })
            .collect())
    }

    /// Coefficients of the derivative of the local polynomial fitted at `point`.
    ///
    /// Same layout as [`MwlsApproximator::coefficients`]; row 0 holds the
    /// derivative at `point` itself.
    ///
    /// # Errors
    /// As for [`MwlsApproximator::differentiate_point`].
    pub fn differentiated_polynomials(
        &self,
        point: &[f64],
        orders: impl Into<DerivativeOrders>,
        distance: Option<f64>,
    ) -> MwlsResult<Mat<f64>> {
        self.check_point(point)?;
        let orders = orders.into().resolve(self.dimensions())?;

        let coefficients = self.coefficients(point, distance)?;
        Ok(&self.basis.differentiation_matrix(&orders) * &coefficients)
    }

    /// Approximated values at every row of `target_points`.
    ///
    /// Rows are evaluated in parallel. Returns an `(n_targets, output_dim())`
    /// matrix; the first failing row's error is returned otherwise.
    ///
    /// ### Example
    /// ```no_run
    /// # use ferreus_mwls::MwlsApproximator;
    /// # use faer::Mat;
    /// # let (mwls, targets): (MwlsApproximator, Mat<f64>) = unimplemented!();
    /// let values = mwls.evaluate(&targets, None)?;
    /// # Ok::<(), ferreus_mwls::MwlsError>(())
    /// ```
    pub fn evaluate(&self, target_points: &Mat<f64>, distance: Option<f64>) -> MwlsResult<Mat<f64>> {
        self.batch(target_points, "evaluate", |point| {
            self.evaluate_point(point, distance)
        })
    }

    /// Partial derivatives at every row of `target_points`.
    ///
    /// Rows are evaluated in parallel. Returns an `(n_targets, output_dim())` matrix.
    pub fn differentiate(
        &self,
        target_points: &Mat<f64>,
        orders: impl Into<DerivativeOrders>,
        distance: Option<f64>,
    ) -> MwlsResult<Mat<f64>> {
        let orders = orders.into();
        self.batch(target_points, "differentiate at", |point| {
            self.differentiate_point(point, orders.clone(), distance)
        })
    }

    fn batch<F>(&self, target_points: &Mat<f64>, action: &str, query: F) -> MwlsResult<Mat<f64>>
    where
        F: Fn(&[f64]) -> MwlsResult<Vec<f64>> + Sync,
    {
        if target_points.ncols() != self.dimensions() {
            return Err(MwlsError::DimensionMismatch {
                expected: self.dimensions(),
                found: target_points.ncols(),
            });
        }

        let batch_start = Instant::now();
        let num_targets = target_points.nrows();

        let rows = (0..num_targets)
            .into_par_iter()
            .map(|i| {
                let point: Vec<f64> = (0..target_points.ncols())
                    .map(|k| target_points[(i, k)])
                    .collect();
                query(&point)
            })
            .collect::<MwlsResult<Vec<Vec<f64>>>>()?;

        if let Some(sink) = &self.progress_callback {
            sink.emit(ProgressMsg::Message {
                message: format!(
                    "Took {:?} to {} {} points using the {} backend",
                    batch_start.elapsed(),
                    action,
                    num_targets,
                    self.backend(),
                )
            });
        }

        Ok(Mat::from_fn(num_targets, self.output_dim(), |i, j| rows[i][j]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::generate_random_points, mwls_test_functions::MwlsTestFunctions,
        progress::CollectingSink,
    };
    use equator::assert;
    use faer::utils::approx::*;
    use ferreus_mwls_utils::{
        kernels::{UniformWeight, WendlandWeight},
        WeightKernelType, WeightParams,
    };

    const BACKENDS: [SearchBackend; 3] = [
        SearchBackend::KdTree,
        SearchBackend::CellLinkedList,
        SearchBackend::Naive,
    ];

    fn gaussian_theta() -> Arc<dyn WeightFunction> {
        Arc::new(|d: f64, _cutoff: f64| (-d * d).exp())
    }

    fn sine_samples() -> (Mat<f64>, Mat<f64>) {
        let xs = Mat::from_fn(41, 1, |i, _| -2.0 + 0.1 * i as f64);
        let fs = MwlsTestFunctions::sine_1d(&xs);
        (xs, fs)
    }

    fn build(
        points: Mat<f64>,
        values: Mat<f64>,
        cutoff: f64,
        weight: Arc<dyn WeightFunction>,
        backend: SearchBackend,
        max_degree: usize,
    ) -> MwlsApproximator {
        let settings = MwlsSettings::builder(backend)
            .max_degree(max_degree)
            .leaf_size(4)
            .build();
        MwlsApproximator::builder(points, values, cutoff, weight)
            .settings(settings)
            .build()
            .unwrap()
    }

    #[test]
    fn sine_scenario_on_every_backend() {
        let (xs, fs) = sine_samples();

        let approximators = [
            MwlsApproximator::kd_tree(xs.clone(), fs.clone(), 0.5, gaussian_theta()).unwrap(),
            MwlsApproximator::cell_linked_list(xs.clone(), fs.clone(), 0.5, gaussian_theta())
                .unwrap(),
            MwlsApproximator::naive(xs, fs, 0.5, gaussian_theta()).unwrap(),
        ];

        for mwls in &approximators {
            let value = mwls.evaluate_point(&[1.0], None).unwrap();
            assert!((value[0] - 1f64.sin()).abs() < 1e-3);

            // The degree 2 fit over a window of half width 0.5 carries a
            // first derivative bias of about 0.016.
            let slope = mwls.differentiate_point(&[1.0], 1, None).unwrap();
            assert!((slope[0] - 1f64.cos()).abs() < 2e-2);

            let slope_tuple = mwls.differentiate_point(&[1.0], [1], None).unwrap();
            assert_eq!(slope, slope_tuple);
        }

        let reference = approximators[2].coefficients(&[1.0], None).unwrap();
        for mwls in &approximators[..2] {
            assert_eq!(mwls.coefficients(&[1.0], None).unwrap(), reference);
        }
    }

    #[test]
    fn quadratic_is_reproduced_on_every_backend() {
        let points = generate_random_points(400, 2, Some(31));
        let values = MwlsTestFunctions::quadratic_2d(&points);
        let targets = Mat::from_fn(25, 2, |i, k| 0.2 + 0.15 * ((i / 5usize.pow(k as u32)) % 5) as f64);
        let expected = MwlsTestFunctions::quadratic_2d(&targets);

        for backend in BACKENDS {
            let mwls = build(
                points.clone(),
                values.clone(),
                0.2,
                Arc::new(WendlandWeight),
                backend,
                2,
            );
            let approximated = mwls.evaluate(&targets, None).unwrap();

            let approx_eq = CwiseMat(ApproxEq::eps() * 1e8);
            assert!(&approximated ~ &expected);
        }
    }

    #[test]
    fn gradient_of_quadratic_is_exact() {
        let points = generate_random_points(300, 2, Some(8));
        let values = MwlsTestFunctions::quadratic_2d(&points);
        let mwls = build(points, values, 0.25, Arc::new(WendlandWeight), SearchBackend::KdTree, 2);

        let targets = Mat::from_fn(6, 2, |i, k| 0.3 + 0.08 * (i + k) as f64);
        let gradient = MwlsTestFunctions::quadratic_2d_gradient(&targets);

        let dx = mwls.differentiate(&targets, [1, 0], None).unwrap();
        let dy = mwls.differentiate(&targets, [0, 1], None).unwrap();
        let dxy = mwls.differentiate(&targets, [1, 1], None).unwrap();
        let dxx = mwls.differentiate(&targets, 2, None).unwrap();

        for i in 0..targets.nrows() {
            assert!((dx[(i, 0)] - gradient[(i, 0)]).abs() < 1e-7);
            assert!((dy[(i, 0)] - gradient[(i, 1)]).abs() < 1e-7);
            assert!((dxy[(i, 0)] - 1.0).abs() < 1e-6);
            assert!((dxx[(i, 0)] - 1.0).abs() < 1e-6);
        }

        // A third derivative of a degree 2 fit vanishes.
        let d3 = mwls.differentiate_point(&[0.5, 0.5], [2, 1], None).unwrap();
        assert_eq!(d3, vec![0.0]);
    }

    #[test]
    fn derivative_matches_finite_differences_of_values() {
        let xs = Mat::from_fn(401, 1, |i, _| 0.005 * i as f64);
        let fs = MwlsTestFunctions::sine_1d(&xs);
        let mwls = build(xs, fs, 0.05, Arc::new(WendlandWeight), SearchBackend::KdTree, 2);

        let targets = Mat::from_fn(4, 1, |i, _| [0.3, 0.77, 1.0, 1.51][i]);
        let exact = MwlsTestFunctions::sine_1d_derivative(&targets);

        let h = 1e-5;
        for (i, x) in (0..targets.nrows()).map(|i| (i, targets[(i, 0)])) {
            let plus = mwls.evaluate_point(&[x + h], None).unwrap()[0];
            let minus = mwls.evaluate_point(&[x - h], None).unwrap()[0];
            let finite_difference = (plus - minus) / (2.0 * h);

            let derivative = mwls.differentiate_point(&[x], 1, None).unwrap()[0];

            assert!((derivative - finite_difference).abs() < 1e-3);
            assert!((derivative - exact[(i, 0)]).abs() < 1e-3);
        }
    }

    #[test]
    fn differentiated_polynomials_hold_shifted_coefficients() {
        let points = generate_random_points(200, 2, Some(3));
        let values = MwlsTestFunctions::quadratic_2d(&points);
        let mwls = build(points, values, 0.3, Arc::new(WendlandWeight), SearchBackend::Naive, 2);

        let q = [0.4, 0.55];
        let dx_poly = mwls.differentiated_polynomials(&q, [1, 0], None).unwrap();
        assert_eq!(dx_poly.shape(), (6, 1));

        // d/dx (1 + 2x - y + x²/2 + xy - 3y²) = 2 + x + y, over offsets from q:
        // (2 + qx + qy) + 1 * dx + 1 * dy
        let expected = [2.0 + q[0] + q[1], 1.0, 1.0, 0.0, 0.0, 0.0];
        for (j, e) in expected.iter().enumerate() {
            assert!((dx_poly[(j, 0)] - e).abs() < 1e-7);
        }

        let dx = mwls.differentiate_point(&q, [1, 0], None).unwrap();
        assert!((dx[0] - dx_poly[(0, 0)]).abs() < 1e-12);
    }

    #[test]
    fn coincident_neighbours_yield_zero_vector() {
        // Three copies of one sample near the origin, the rest far away.
        let points = Mat::from_fn(8, 2, |i, k| match i < 3 {
            true => 0.1 * (k + 1) as f64,
            false => 5.0 + i as f64 + k as f64,
        });
        let values = Mat::from_fn(8, 1, |i, _| 1.0 + i as f64);
        let sink = Arc::new(CollectingSink::new());

        let settings = MwlsSettings::builder(SearchBackend::KdTree).max_degree(1).build();
        let mwls = MwlsApproximator::builder(points, values, 0.5, Arc::new(UniformWeight))
            .settings(settings)
            .progress_callback(sink.clone())
            .build()
            .unwrap();

        let value = mwls.evaluate_point(&[0.1, 0.2], None).unwrap();
        assert_eq!(value, vec![0.0]);

        let coefficients = mwls.coefficients(&[0.1, 0.2], None).unwrap();
        assert_eq!(coefficients, Mat::<f64>::zeros(3, 1));

        let singular_reports = sink
            .messages()
            .into_iter()
            .filter(|m| matches!(m, ProgressMsg::SingularSystem { .. }))
            .count();
        assert_eq!(singular_reports, 2);
    }

    #[test]
    fn query_beyond_cutoff_has_insufficient_neighbours() {
        let (xs, fs) = sine_samples();

        for backend in BACKENDS {
            let mwls = build(xs.clone(), fs.clone(), 0.5, gaussian_theta(), backend, 2);

            let err = mwls.evaluate_point(&[10.0], None).unwrap_err();
            assert_eq!(err, MwlsError::InsufficientNeighbours { radius: 0.5 });

            let err = mwls.differentiate_point(&[-3.0], 1, None).unwrap_err();
            assert_eq!(err, MwlsError::InsufficientNeighbours { radius: 0.5 });
        }
    }

    #[test]
    fn distance_override_widens_the_search() {
        let (xs, fs) = sine_samples();
        let mwls = build(xs, fs, 0.5, gaussian_theta(), SearchBackend::CellLinkedList, 2);

        assert!(mwls.neighbours(&[3.0], None).unwrap().is_empty());
        assert_eq!(mwls.neighbours(&[3.0], Some(1.45)).unwrap().len(), 5);
        assert_eq!(mwls.neighbours(&[0.0], Some(0.25)).unwrap(), vec![18, 19, 20, 21, 22]);

        let value = mwls.evaluate_point(&[2.2], Some(1.0)).unwrap();
        assert!((value[0] - 2.2f64.sin()).abs() < 5e-2);
    }

    #[test]
    fn query_dimension_is_checked() {
        let (xs, fs) = sine_samples();
        let mwls = MwlsApproximator::naive(xs, fs, 0.5, gaussian_theta()).unwrap();

        let mismatch = MwlsError::DimensionMismatch {
            expected: 1,
            found: 2,
        };
        assert_eq!(mwls.evaluate_point(&[0.0, 0.0], None).unwrap_err(), mismatch);
        assert_eq!(mwls.neighbours(&[0.0, 0.0], None).unwrap_err(), mismatch);
        assert_eq!(
            mwls.differentiate_point(&[0.0], [1, 0], None).unwrap_err(),
            mismatch
        );
        assert_eq!(
            mwls.evaluate(&Mat::zeros(3, 2), None).unwrap_err(),
            mismatch
        );
    }

    #[test]
    fn construction_is_validated() {
        let (xs, fs) = sine_samples();
        let build_with = |cutoff: f64, settings: MwlsSettings| {
            MwlsApproximator::builder(xs.clone(), fs.clone(), cutoff, gaussian_theta())
                .settings(settings)
                .build()
                .unwrap_err()
        };
        let defaults = MwlsSettings::default();

        for cutoff in [0.0, -1.0, f64::INFINITY] {
            assert_eq!(
                build_with(cutoff, defaults),
                MwlsError::InvalidCutoff { cutoff }
            );
        }
        assert!(matches!(
            build_with(f64::NAN, defaults),
            MwlsError::InvalidCutoff { .. }
        ));

        let zero_leaf = MwlsSettings::builder(SearchBackend::KdTree).leaf_size(0).build();
        assert!(matches!(
            build_with(0.5, zero_leaf),
            MwlsError::InvalidConfiguration { .. }
        ));

        let zero_outputs = MwlsSettings::builder(SearchBackend::Naive).output_dim(0).build();
        assert!(matches!(
            build_with(0.5, zero_outputs),
            MwlsError::InvalidConfiguration { .. }
        ));

        // 41 samples cannot determine the 56 terms of a degree 55 polynomial.
        let too_high = MwlsSettings::builder(SearchBackend::Naive).max_degree(55).build();
        assert!(matches!(
            build_with(0.5, too_high),
            MwlsError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn oversized_basis_is_a_configuration_error() {
        let points = generate_random_points(50, 20, Some(5));
        let values = Mat::from_fn(50, 1, |i, _| i as f64);

        for max_degree in [200, usize::MAX] {
            let settings = MwlsSettings::builder(SearchBackend::Naive)
                .max_degree(max_degree)
                .build();
            let result = MwlsApproximator::builder(points.clone(), values.clone(), 0.5, gaussian_theta())
                .settings(settings)
                .build();
            assert!(matches!(result, Err(MwlsError::InvalidConfiguration { .. })));
        }
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let (xs, fs) = sine_samples();
        let build = |xs: Mat<f64>, fs: Mat<f64>| {
            MwlsApproximator::kd_tree(xs, fs, 0.5, gaussian_theta()).unwrap_err()
        };

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut bad_points = xs.clone();
            bad_points[(3, 0)] = bad;
            assert!(matches!(
                build(bad_points, fs.clone()),
                MwlsError::InvalidConfiguration { .. }
            ));

            let mut bad_values = fs.clone();
            bad_values[(7, 0)] = bad;
            assert!(matches!(
                build(xs.clone(), bad_values),
                MwlsError::InvalidConfiguration { .. }
            ));
        }
    }

    #[test]
    fn sample_sets_are_validated() {
        let weight = gaussian_theta();

        let err = MwlsApproximator::kd_tree(Mat::zeros(5, 2), Mat::zeros(4, 1), 0.5, weight.clone())
            .unwrap_err();
        assert_eq!(err, MwlsError::SampleCountMismatch { points: 5, values: 4 });

        let err = MwlsApproximator::kd_tree(Mat::zeros(0, 2), Mat::zeros(0, 1), 0.5, weight.clone())
            .unwrap_err();
        assert_eq!(err, MwlsError::EmptySampleSet);

        let err = MwlsApproximator::naive(Mat::zeros(10, 0), Mat::zeros(10, 1), 0.5, weight.clone())
            .unwrap_err();
        assert!(matches!(err, MwlsError::InvalidConfiguration { .. }));

        let err = MwlsApproximatorBuilder::from_combined(Mat::zeros(10, 2), 0.5, weight)
            .settings(MwlsSettings::builder(SearchBackend::Naive).output_dim(2).build())
            .build()
            .unwrap_err();
        assert!(matches!(err, MwlsError::InvalidConfiguration { .. }));
    }

    #[test]
    fn combined_samples_match_separate_samples() {
        let points = generate_random_points(150, 2, Some(12));
        let values = Mat::from_fn(150, 2, |i, j| match j {
            0 => points[(i, 0)] + points[(i, 1)],
            _ => points[(i, 0)] * points[(i, 1)],
        });
        let combined = Mat::from_fn(150, 4, |i, j| match j < 2 {
            true => points[(i, j)],
            false => values[(i, j - 2)],
        });

        let settings = MwlsSettings::builder(SearchBackend::KdTree).output_dim(2).build();
        let from_combined =
            MwlsApproximatorBuilder::from_combined(combined, 0.3, Arc::new(WendlandWeight))
                .settings(settings)
                .build()
                .unwrap();
        let separate = build(points, values, 0.3, Arc::new(WendlandWeight), SearchBackend::KdTree, 2);

        assert_eq!(from_combined.dimensions(), 2);
        assert_eq!(from_combined.output_dim(), 2);
        assert_eq!(from_combined.points(), separate.points());
        assert_eq!(from_combined.point_values(), separate.point_values());

        let q = [0.5, 0.4];
        let value = from_combined.evaluate_point(&q, None).unwrap();
        assert_eq!(value, separate.evaluate_point(&q, None).unwrap());
        assert!((value[0] - 0.9).abs() < 1e-8);
        assert!((value[1] - 0.2).abs() < 1e-8);
    }

    #[test]
    fn batch_queries_match_point_queries() {
        let points = generate_random_points(500, 2, Some(99));
        let values = MwlsTestFunctions::franke_2d(&points);
        let weight = WeightParams::builder(WeightKernelType::Gaussian)
            .shape(0.05)
            .build()
            .into_weight_function();
        let mwls = build(points, values, 0.15, weight, SearchBackend::CellLinkedList, 2);

        let targets = crate::common::create_evaluation_grid(&[(0.2, 0.8), (0.2, 0.8)], &[4, 4]);
        let batch_values = mwls.evaluate(&targets, None).unwrap();
        let batch_dy = mwls.differentiate(&targets, [0, 1], None).unwrap();

        for i in 0..targets.nrows() {
            let q = [targets[(i, 0)], targets[(i, 1)]];
            assert_eq!(batch_values[(i, 0)], mwls.evaluate_point(&q, None).unwrap()[0]);
            assert_eq!(batch_dy[(i, 0)], mwls.differentiate_point(&q, [0, 1], None).unwrap()[0]);
        }
    }

    #[test]
    fn progress_events_are_emitted() {
        let (xs, fs) = sine_samples();
        let sink = Arc::new(CollectingSink::new());

        let mwls = MwlsApproximator::builder(xs, fs, 0.5, gaussian_theta())
            .settings(MwlsSettings::builder(SearchBackend::CellLinkedList).build())
            .progress_callback(sink.clone())
            .build()
            .unwrap();

        let targets = Mat::from_fn(5, 1, |i, _| -1.0 + 0.5 * i as f64);
        mwls.evaluate(&targets, None).unwrap();

        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            messages[0],
            ProgressMsg::BackendBuilt {
                backend: SearchBackend::CellLinkedList,
                num_points: 41,
                ..
            }
        ));
        match &messages[1] {
            ProgressMsg::Message { message } => {
                assert!(message.contains("to evaluate 5 points"));
                assert!(message.contains("cell linked list"));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn approximator_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MwlsApproximator>();
    }

    #[test]
    fn error_messages_name_the_problem() {
        assert_eq!(
            MwlsError::DimensionMismatch {
                expected: 2,
                found: 3
            }
            .to_string(),
            "dimension mismatch: expected 2, found 3"
        );
        assert_eq!(
            MwlsError::InsufficientNeighbours { radius: 0.5 }.to_string(),
            "no samples within distance 0.5 of the query point"
        );
    }
}
