use ferreus_mwls::{
    config::{MwlsSettings, SearchBackend},
    create_evaluation_grid, generate_random_points, MwlsApproximator, MwlsTestFunctions,
};
use ferreus_mwls_utils::{WeightKernelType, WeightParams};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Random source points in [0, 1]^2
    let points = generate_random_points(5_000, 2, Some(42));

    // Values at the source points from Franke's function
    let point_values = MwlsTestFunctions::franke_2d(&points);

    let weight = WeightParams::builder(WeightKernelType::Wendland)
        .build()
        .into_weight_function();

    // Regular grid of target points
    let n = 50;
    let target_points = create_evaluation_grid(&[(0.05, 0.95), (0.05, 0.95)], &[n, n]);
    let exact = MwlsTestFunctions::franke_2d(&target_points);
    let exact_gradient = MwlsTestFunctions::franke_2d_gradient(&target_points);

    for backend in [
        SearchBackend::KdTree,
        SearchBackend::CellLinkedList,
        SearchBackend::Naive,
    ] {
        let settings = MwlsSettings::builder(backend).max_degree(2).build();

        let mwls = MwlsApproximator::builder(
            points.clone(),
            point_values.clone(),
            0.08,
            weight.clone(),
        )
        .settings(settings)
        .build()?;

        let start = std::time::Instant::now();
        let values = mwls.evaluate(&target_points, None)?;
        let dx = mwls.differentiate(&target_points, [1, 0], None)?;
        let elapsed = start.elapsed();

        let max_error = (0..values.nrows())
            .map(|i| (values[(i, 0)] - exact[(i, 0)]).abs())
            .fold(0.0, f64::max);
        let max_dx_error = (0..dx.nrows())
            .map(|i| (dx[(i, 0)] - exact_gradient[(i, 0)]).abs())
            .fold(0.0, f64::max);

        println!(
            "{backend}: {:?}, max value error {max_error:.2e}, max d/dx error {max_dx_error:.2e}",
            elapsed
        );
    }

    Ok(())
}
