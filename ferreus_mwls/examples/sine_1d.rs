use faer::Mat;
use ferreus_mwls::{progress::closure_sink, MwlsApproximator, MwlsTestFunctions};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Samples of sin(x) at -2, -1.9, ..., 2
    let xs = Mat::from_fn(41, 1, |i, _| -2.0 + 0.1 * i as f64);
    let fs = MwlsTestFunctions::sine_1d(&xs);

    // Gaussian weight, ignoring the cutoff
    let theta = Arc::new(|d: f64, _cutoff: f64| (-d * d).exp());

    // Print progress messages as they arrive
    let (sink, listener) = closure_sink(16, |msg| println!("{msg:?}"));

    let mwls = MwlsApproximator::builder(xs, fs, 0.5, theta)
        .progress_callback(sink)
        .build()?;

    for x in [-1.0, 0.0, 0.5, 1.0, 1.5] {
        let value = mwls.evaluate_point(&[x], None)?[0];
        let slope = mwls.differentiate_point(&[x], 1, None)?[0];

        println!(
            "x = {x:5.2}  f = {value:.6} (sin {:.6})  f' = {slope:.6} (cos {:.6})",
            x.sin(),
            x.cos()
        );
    }

    // Outside the samples the default radius finds nothing, an override does
    let x = 2.3;
    match mwls.evaluate_point(&[x], None) {
        Ok(value) => println!("x = {x}: {value:?}"),
        Err(err) => println!("x = {x}: {err}"),
    }
    println!("x = {x} within 1.0: {:?}", mwls.evaluate_point(&[x], Some(1.0))?);

    drop(mwls);
    let _ = listener.join();

    Ok(())
}
