//! Runtime integrator settings
//!
//! Selects the stepping scheme and its numerical bounds. Built from the YAML
//! `IntegratorConfig` by `Scenario`, or directly through the constructors below.

use super::dynamics::DynamicsModel;
use super::mass_matrix::{MassMatrixInverter, DEFAULT_SINGULARITY_EPSILON};
use super::params::PhysicalParameters;
use crate::error::SimError;

/// Internal RK4 step cap; one step per 0.025 s sample drifts badly in energy on chaotic runs
pub const DEFAULT_RK4_MAX_STEP: f64 = 0.0025;
pub const DEFAULT_MIN_STEP: f64 = 1e-9;
pub const DEFAULT_MAX_STEP_RETRIES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemeSettings {
    /// Classical RK4; each sample interval is split into equal steps no longer than `max_step`,
    /// or taken in one step when `max_step` is `None`
    Rk4 { max_step: Option<f64> },

    /// Cash–Karp 4(5) with step halving/doubling against `tolerance`
    Adaptive {
        tolerance: f64,
        min_step: f64,
        max_step: Option<f64>,
        max_step_retries: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    pub scheme: SchemeSettings,
    pub singularity_epsilon: f64, // threshold on |Δ| for the mass matrix inverse
}

impl Default for Engine {
    fn default() -> Self {
        Self::rk4()
    }
}

impl Engine {
    /// Fixed-step RK4 with internal steps of at most `DEFAULT_RK4_MAX_STEP`
    pub fn rk4() -> Self {
        Self {
            scheme: SchemeSettings::Rk4 { max_step: Some(DEFAULT_RK4_MAX_STEP) },
            singularity_epsilon: DEFAULT_SINGULARITY_EPSILON,
        }
    }

    /// Adaptive stepping; the tolerance has no default and must be chosen
    pub fn adaptive(tolerance: f64, min_step: f64) -> Self {
        Self {
            scheme: SchemeSettings::Adaptive {
                tolerance,
                min_step,
                max_step: None,
                max_step_retries: DEFAULT_MAX_STEP_RETRIES,
            },
            singularity_epsilon: DEFAULT_SINGULARITY_EPSILON,
        }
    }

    /// Cap the internal step length (both schemes)
    pub fn with_max_step(mut self, step: f64) -> Self {
        match &mut self.scheme {
            SchemeSettings::Rk4 { max_step } => *max_step = Some(step),
            SchemeSettings::Adaptive { max_step, .. } => *max_step = Some(step),
        }
        self
    }

    /// Consecutive rejections allowed before giving up (adaptive only)
    pub fn with_max_step_retries(mut self, retries: usize) -> Self {
        if let SchemeSettings::Adaptive { max_step_retries, .. } = &mut self.scheme {
            *max_step_retries = retries;
        }
        self
    }

    pub fn with_singularity_epsilon(mut self, epsilon: f64) -> Self {
        self.singularity_epsilon = epsilon;
        self
    }

    /// Equations of motion whose mass-matrix inverse uses this engine's singularity threshold
    pub fn dynamics(&self, parameters: PhysicalParameters) -> DynamicsModel {
        DynamicsModel::new(parameters).with_inverter(MassMatrixInverter::new(self.singularity_epsilon))
    }

    pub fn name(&self) -> &'static str {
        match self.scheme {
            SchemeSettings::Rk4 { .. } => "rk4",
            SchemeSettings::Adaptive { .. } => "adaptive",
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.singularity_epsilon.is_finite() && self.singularity_epsilon >= 0.0) {
            return Err(SimError::invalid_integrator(format!(
                "singularity epsilon must be finite and non-negative, got {}",
                self.singularity_epsilon
            )));
        }

        let max_step = match self.scheme {
            SchemeSettings::Rk4 { max_step } => max_step,
            SchemeSettings::Adaptive { tolerance, min_step, max_step, .. } => {
                if !(tolerance.is_finite() && tolerance > 0.0) {
                    return Err(SimError::invalid_integrator(format!(
                        "tolerance must be positive and finite, got {tolerance}"
                    )));
                }
                if !(min_step.is_finite() && min_step > 0.0) {
                    return Err(SimError::invalid_integrator(format!(
                        "min_step must be positive and finite, got {min_step}"
                    )));
                }
                if let Some(h) = max_step {
                    if h < min_step {
                        return Err(SimError::invalid_integrator(format!(
                            "max_step ({h}) is smaller than min_step ({min_step})"
                        )));
                    }
                }
                max_step
            }
        };

        if let Some(h) = max_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(SimError::invalid_integrator(format!(
                    "max_step must be positive and finite, got {h}"
                )));
            }
        }
        Ok(())
    }
}
