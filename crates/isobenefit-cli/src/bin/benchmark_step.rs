use isobenefit_core::{Affine, Cell, CellClass, Grid, Land, LandConfig};
use std::time::{Duration, Instant};

fn build_land(side: usize, config: &LandConfig) -> Land {
    let transform = Affine::north_up(0.0, side as f64 * config.cell_size_m, config.cell_size_m);
    let quarter = side / 4;
    let seeds: Vec<(f64, f64)> = [
        Cell::new(quarter, quarter),
        Cell::new(quarter, side - quarter),
        Cell::new(side - quarter, quarter),
        Cell::new(side - quarter, side - quarter),
    ]
    .into_iter()
    .map(|cell| transform.xy(cell))
    .collect();
    Land::new(
        Grid::filled(side, side, CellClass::Nature),
        transform,
        &seeds,
        config.clone(),
    )
}

fn main() {
    let side = 200;
    let steps = 20;
    let config = LandConfig {
        walk_dist_m: 1000.0,
        build_prob: 0.3,
        cent_prob_nb: 0.02,
        random_seed: 42,
        ..LandConfig::default()
    };
    println!("Benchmarking {steps} steps on a {side}x{side} grid ({} m cells)", config.cell_size_m);

    let mut land = build_land(side, &config);
    let mut areas = Duration::ZERO;
    let mut scan = Duration::ZERO;
    let start = Instant::now();
    for _ in 0..steps {
        let outcome = land.step();
        areas += Duration::from_micros(outcome.timings.areas_us);
        scan += Duration::from_micros(outcome.timings.scan_us);
    }
    let total = start.elapsed();
    println!("Time for {steps} steps: {total:?}");
    println!("Avg time per step: {:?}", total / steps as u32);
    println!("  green area labelling: {:?}", areas / steps as u32);
    println!("  frontier scan:        {:?}", scan / steps as u32);

    let start = Instant::now();
    let drift = land.surface_drift();
    println!("Full surface recomputation: {:?} (drift {drift:e})", start.elapsed());
    println!(
        "Developed cells: {} built, {} centres",
        land.classes().count(CellClass::Built),
        land.classes().count(CellClass::Centre)
    );
}
