//! Error types for the pendulum simulation
//!
//! `SimError` covers everything the core can report. A run that stops
//! part-way returns a [`RunFailure`], which keeps the samples recorded before
//! the failure so callers can still render or inspect them

use thiserror::Error;

use crate::simulation::trajectory::TrajectoryBuffer;

/// Errors raised while configuring or advancing a simulation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Physical constants out of range (non-positive `L`/`m`, bad `g`)
    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// Time grid is empty, reversed or not finite
    #[error("invalid time grid: {reason}")]
    InvalidTimeGrid { reason: String },

    /// Integrator settings cannot be used (missing tolerance, bad step bounds)
    #[error("invalid integrator configuration: {reason}")]
    InvalidIntegrator { reason: String },

    /// Mass matrix not invertible, or a non-finite value was produced
    #[error("numerical singularity: {reason}")]
    NumericalSingularity { reason: String },

    /// Adaptive stepping could not meet tolerance above the minimum step
    #[error("step size underflow at t = {t}: dt = {dt:e} fell below the minimum step")]
    StepSizeUnderflow { t: f64, dt: f64 },

    /// Run stopped by its cancel token
    #[error("run cancelled at t = {t}")]
    Cancelled { t: f64 },
}

impl SimError {
    pub fn invalid_parameters(reason: impl Into<String>) -> Self {
        Self::InvalidParameters { reason: reason.into() }
    }

    pub fn invalid_time_grid(reason: impl Into<String>) -> Self {
        Self::InvalidTimeGrid { reason: reason.into() }
    }

    pub fn invalid_integrator(reason: impl Into<String>) -> Self {
        Self::InvalidIntegrator { reason: reason.into() }
    }

    pub fn singularity(reason: impl Into<String>) -> Self {
        Self::NumericalSingularity { reason: reason.into() }
    }

    /// True for errors that abort a run mid-way (as opposed to configuration errors)
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            Self::NumericalSingularity { .. } | Self::StepSizeUnderflow { .. } | Self::Cancelled { .. }
        )
    }
}

/// A run that aborted after it started
///
/// `partial` holds every sample recorded up to (not including) the failing one
#[derive(Debug, Error)]
#[error("run aborted after {} samples: {error}", .partial.len())]
pub struct RunFailure {
    #[source]
    pub error: SimError,
    pub partial: TrajectoryBuffer,
}

impl RunFailure {
    pub fn new(error: SimError, partial: TrajectoryBuffer) -> Self {
        Self { error, partial }
    }

    /// Failure raised before any sample could be recorded
    pub fn before_start(error: SimError) -> Self {
        Self { error, partial: TrajectoryBuffer::default() }
    }
}
