/////////////////////////////////////////////////////////////////////////////////////////////
//
// Tunes the shape parameter of a Gaussian RBF fitted to Franke's function.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Usage: `cargo run --release --example optimize_gamma_franke [config.json]`
//!
//! Without an argument a default configuration over `gamma` in `[5, 200]` is
//! used and written to `optimize_gamma_franke.json`. The tuned interpolant is
//! evaluated on a regular grid and written to `optimize_gamma_franke.dat`.

use concentric_rbf::{
    GaussianRbf, InterpolationScheme, PointSet, TestFunctions, create_evaluation_grid,
    generate_random_points, interpolate_on_set,
    config::SearchConfig,
    distance::{GlobalDistanceKind, LocalDistanceKind},
    io::{WriteFlags, write_point_set},
    objective::Objective,
    progress::{ProgressMsg, closure_sink},
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SearchConfig::load(path)?,
        None => {
            let mut config = SearchConfig::new(5.0, 200.0);
            config.local_distance = LocalDistanceKind::AbsDiff;
            config.global_distance = GlobalDistanceKind::Rms;
            config.objective = Objective::H2Like;
            config.settings.num_bisec = 8;
            config.save("optimize_gamma_franke.json")?;
            config
        }
    };

    // Training and reference data from Franke's function
    let training = TestFunctions::franke_2d(&generate_random_points(200, 2, Some(42)).ok_or("no points")?)?;
    let reference = TestFunctions::franke_2d(&generate_random_points(400, 2, Some(7)).ok_or("no points")?)?;

    let (progress, listener) = closure_sink(256, |msg| match msg {
        ProgressMsg::GammaCandidate { stage, gamma, score } => {
            println!("{stage:?}: gamma = {gamma:12.5e}, score = {score:12.5e}")
        }
        ProgressMsg::Message { message } => println!("{message}"),
        ProgressMsg::EvaluationProgress { .. } => {}
    });

    let mut rbf = GaussianRbf::from_training(&training)?
        .gamma(config.gamma_min)
        .nugget(1e-10)
        .build()?;

    let result = config.optimize(&mut rbf, &reference, Some(progress))?;
    println!(
        "best gamma {:.6e} (score {:.6e}) after {} candidates, stopped by {:?}",
        result.best_gamma,
        result.best_score,
        result.history.len(),
        result.stop_reason,
    );
    assert_eq!(rbf.gamma(), result.best_gamma);

    // Evaluate the tuned interpolant on a grid in [0, 1]^2
    let n = 50;
    let grid = create_evaluation_grid(&[(0.0, 1.0), (0.0, 1.0)], &[n, n]).ok_or("empty grid")?;
    let mut output = PointSet::new(grid);
    interpolate_on_set(&rbf, &mut output, true, false)?;
    write_point_set(
        "optimize_gamma_franke.dat",
        &output,
        WriteFlags {
            values: true,
            gradients: true,
            hessians: false,
        },
    )?;

    let _ = listener.join();

    Ok(())
}
