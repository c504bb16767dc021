//! Build fully-initialized pendulum runs from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime `Scenario`
//! containing:
//! - integrator settings (`Engine`)
//! - physical constants (`PhysicalParameters`)
//! - initial state (`StateVector` at `grid.t0`)
//! - output sampling grid (`TimeGridSpec`)
//!
//! Everything is validated here, so a `Scenario` that exists can be run.

use super::dynamics::DynamicsModel;
use super::engine::{Engine, SchemeSettings, DEFAULT_MAX_STEP_RETRIES, DEFAULT_MIN_STEP, DEFAULT_RK4_MAX_STEP};
use super::integrator::{CancelToken, Integrator};
use super::mass_matrix::DEFAULT_SINGULARITY_EPSILON;
use super::params::PhysicalParameters;
use super::states::{StateVector, TimeGridSpec};
use super::trajectory::TrajectoryBuffer;
use crate::configuration::config::{SchemeConfig, ScenarioConfig};
use crate::error::{RunFailure, SimError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    pub engine: Engine,
    pub parameters: PhysicalParameters,
    pub initial: StateVector,
    pub grid: TimeGridSpec,
}

impl Scenario {
    /// Assemble and validate a scenario from runtime values
    pub fn new(
        parameters: PhysicalParameters,
        initial: StateVector,
        grid: TimeGridSpec,
        engine: Engine,
    ) -> Result<Self, SimError> {
        parameters.validate()?;
        grid.validate()?;
        engine.validate()?;
        if !initial.is_finite() {
            return Err(SimError::invalid_parameters(format!(
                "initial state must be finite, got {:?}",
                initial.to_array()
            )));
        }
        Ok(Self { engine, parameters, initial, grid })
    }

    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = PhysicalParameters {
            g: p_cfg.g,
            L: p_cfg.L,
            m: p_cfg.m,
        };

        let initial = StateVector::new(cfg.initial.theta, cfg.initial.p);

        let grid = TimeGridSpec {
            t0: cfg.time.t0,
            t1: cfg.time.t1,
            num_samples: cfg.time.samples,
        };

        // Engine (runtime) from IntegratorConfig
        let i_cfg = cfg.integrator;
        let scheme = match i_cfg.scheme {
            SchemeConfig::Rk4 => SchemeSettings::Rk4 {
                max_step: Some(i_cfg.max_step.unwrap_or(DEFAULT_RK4_MAX_STEP)),
            },
            SchemeConfig::Adaptive => {
                let tolerance = i_cfg.tolerance.ok_or_else(|| {
                    SimError::invalid_integrator("the adaptive scheme needs an explicit tolerance")
                })?;
                SchemeSettings::Adaptive {
                    tolerance,
                    min_step: i_cfg.min_step.unwrap_or(DEFAULT_MIN_STEP),
                    max_step: i_cfg.max_step,
                    max_step_retries: i_cfg.max_step_retries.unwrap_or(DEFAULT_MAX_STEP_RETRIES),
                }
            }
        };
        let engine = Engine {
            scheme,
            singularity_epsilon: i_cfg.singularity_epsilon.unwrap_or(DEFAULT_SINGULARITY_EPSILON),
        };

        Self::new(parameters, initial, grid, engine)
    }

    /// Equations of motion for this scenario's parameters and singularity threshold
    pub fn dynamics(&self) -> DynamicsModel {
        self.engine.dynamics(self.parameters)
    }

    pub fn run(&self) -> Result<TrajectoryBuffer, RunFailure> {
        self.execute(None)
    }

    /// Run with a cancel token checked between steps
    pub fn run_with_cancel(&self, cancel: &CancelToken) -> Result<TrajectoryBuffer, RunFailure> {
        self.execute(Some(cancel))
    }

    fn execute(&self, cancel: Option<&CancelToken>) -> Result<TrajectoryBuffer, RunFailure> {
        let dynamics = self.dynamics();
        Integrator::new(self.engine).integrate(&dynamics, &self.initial, &self.grid, self.parameters.L, cancel)
    }
}
