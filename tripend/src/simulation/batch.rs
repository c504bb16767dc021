//! Independent runs in parallel
//!
//! Each scenario owns its parameters, state and output buffer, so a batch needs
//! no synchronization beyond collecting the results. Output order matches input order.

use rayon::prelude::*;
use tracing::debug;

use super::integrator::CancelToken;
use super::scenario::Scenario;
use super::trajectory::TrajectoryBuffer;
use crate::error::RunFailure;

pub type RunResult = Result<TrajectoryBuffer, RunFailure>;

/// Run every scenario on the rayon pool
pub fn run_batch(scenarios: &[Scenario]) -> Vec<RunResult> {
    debug!(runs = scenarios.len(), "starting batch");
    scenarios.par_iter().map(Scenario::run).collect()
}

/// Same as [`run_batch`], with one token that stops all runs
pub fn run_batch_with_cancel(scenarios: &[Scenario], cancel: &CancelToken) -> Vec<RunResult> {
    debug!(runs = scenarios.len(), "starting cancellable batch");
    scenarios.par_iter().map(|s| s.run_with_cancel(cancel)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::simulation::engine::Engine;
    use crate::simulation::params::PhysicalParameters;
    use crate::simulation::states::{StateVector, TimeGridSpec};

    fn scenario(theta1: f64) -> Scenario {
        Scenario::new(
            PhysicalParameters::default(),
            StateVector::new([theta1, 0.0, 0.0], [0.0; 3]),
            TimeGridSpec::new(0.0, 1.0, 11).unwrap(),
            Engine::rk4(),
        )
        .unwrap()
    }

    #[test]
    fn batch_matches_sequential_runs() {
        let scenarios: Vec<Scenario> = (0..8).map(|i| scenario(0.1 * i as f64)).collect();
        let parallel = run_batch(&scenarios);
        assert_eq!(parallel.len(), scenarios.len());

        for (s, got) in scenarios.iter().zip(parallel.iter()) {
            let want = s.run().unwrap();
            assert_eq!(got.as_ref().unwrap(), &want);
        }
    }

    #[test]
    fn cancelled_batch_reports_every_run() {
        let scenarios: Vec<Scenario> = (0..4).map(|i| scenario(0.2 * i as f64)).collect();
        let token = CancelToken::new();
        token.cancel();
        let results = run_batch_with_cancel(&scenarios, &token);
        assert_eq!(results.len(), 4);
        for r in results {
            let failure = r.unwrap_err();
            assert_eq!(failure.error, SimError::Cancelled { t: 0.0 });
            assert_eq!(failure.partial.len(), 1);
        }
    }
}
