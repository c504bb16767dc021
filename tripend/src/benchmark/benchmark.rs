use std::time::Instant;

use crate::simulation::engine::Engine;
use crate::simulation::params::PhysicalParameters;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{StateVector, TimeGridSpec};

/// One benchmark row
#[derive(Debug, Clone)]
pub struct BenchRow {
    pub label: String,
    pub steps: usize,
    pub rejected: usize,
    pub ms: f64,
    pub energy_drift: Option<f64>, // None if the run failed
}

/// Reference start: first link nearly inverted, the other two horizontal
pub fn reference_state() -> StateVector {
    use std::f64::consts::PI;
    StateVector::new([PI - 0.1, -PI / 2.0, -PI / 2.0], [0.0, 0.0, 0.0])
}

/// Time one scenario run and measure its energy drift
pub fn bench_scenario(label: &str, scenario: &Scenario) -> BenchRow {
    let t0 = Instant::now();
    let result = scenario.run();
    let ms = t0.elapsed().as_secs_f64() * 1000.0;

    let dynamics = scenario.dynamics();
    match result {
        Ok(buf) => BenchRow {
            label: label.to_string(),
            steps: buf.stats.steps,
            rejected: buf.stats.rejected_steps,
            ms,
            energy_drift: buf.energy_drift(&dynamics).ok(),
        },
        Err(failure) => BenchRow {
            label: label.to_string(),
            steps: failure.partial.stats.steps,
            rejected: failure.partial.stats.rejected_steps,
            ms,
            energy_drift: None,
        },
    }
}

/// Fixed RK4 at several internal step caps against adaptive Cash–Karp at
/// several tolerances, all on the reference scenario over t ∈ [0, 20]
/// Prints CSV so the output can be pasted straight into a spreadsheet
pub fn bench_schemes() -> Vec<BenchRow> {
    let params = PhysicalParameters::default();
    let initial = reference_state();
    let grid = TimeGridSpec { t0: 0.0, t1: 20.0, num_samples: 800 };

    let engines: Vec<(String, Engine)> = [0.025, 0.01, 0.005, 0.0025]
        .iter()
        .map(|&h| (format!("rk4 h={h}"), Engine::rk4().with_max_step(h)))
        .chain(
            [1e-6, 1e-8, 1e-10]
                .iter()
                .map(|&tol| (format!("adaptive tol={tol:e}"), Engine::adaptive(tol, 1e-12))),
        )
        .collect();

    println!("scheme,steps,rejected,ms,energy_drift");

    let mut rows = Vec::with_capacity(engines.len());
    for (label, engine) in engines {
        let scenario = match Scenario::new(params, initial, grid, engine) {
            Ok(s) => s,
            Err(e) => {
                println!("{label},-,-,-,{e}");
                continue;
            }
        };

        let row = bench_scenario(&label, &scenario);
        let drift = row.energy_drift.map_or_else(|| "failed".to_string(), |d| format!("{d:.3e}"));
        println!("{},{},{},{:.3},{}", row.label, row.steps, row.rejected, row.ms, drift);
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_row_reports_work() {
        let scenario = Scenario::new(
            PhysicalParameters::default(),
            reference_state(),
            TimeGridSpec::new(0.0, 1.0, 41).unwrap(),
            Engine::rk4(),
        )
        .unwrap();
        let row = bench_scenario("rk4", &scenario);
        // 40 sample intervals of 0.025 s, ten default substeps each
        assert_eq!(row.steps, 400);
        assert_eq!(row.rejected, 0);
        assert!(row.energy_drift.is_some());
    }
}
