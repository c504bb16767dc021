//! Hamiltonian equations of motion for the triple pendulum
//!
//! `DynamicsModel` turns a `StateVector` into its `DerivativeVector`:
//! velocities come from the inverted mass matrix, momentum rates from the
//! velocity-coupling and gravity terms of `∂L/∂θ`. The system is autonomous,
//! so time is not an input.

use super::mass_matrix::{Cosines, MassMatrixInverter, NMat3};
use super::params::PhysicalParameters;
use super::states::{DerivativeVector, NVec3, StateVector};
use crate::error::SimError;

/// Anything that can produce the time derivative of a `StateVector`
/// Integrators are written against this trait, not against the pendulum
pub trait Dynamics {
    fn derivative(&self, state: &StateVector) -> Result<DerivativeVector, SimError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsModel {
    pub params: PhysicalParameters,
    pub inverter: MassMatrixInverter,
}

impl DynamicsModel {
    pub fn new(params: PhysicalParameters) -> Self {
        Self {
            params,
            inverter: MassMatrixInverter::default(),
        }
    }

    pub fn with_inverter(mut self, inverter: MassMatrixInverter) -> Self {
        self.inverter = inverter;
        self
    }

    /// Angular velocities `θ̇ = M⁻¹(θ) p`
    pub fn angular_velocities(&self, state: &StateVector) -> Result<NVec3, SimError> {
        let c = Cosines::from_angles(&state.theta);
        self.inverter.inverse_apply(&c, &self.params, &state.p)
    }

    /// Mass matrix at the state's configuration
    pub fn mass_matrix(&self, state: &StateVector) -> NMat3 {
        MassMatrixInverter::mass_matrix(&Cosines::from_angles(&state.theta), &self.params)
    }

    /// `T = ½ pᵀ θ̇`
    pub fn kinetic_energy(&self, state: &StateVector) -> Result<f64, SimError> {
        let theta_dot = self.angular_velocities(state)?;
        Ok(0.5 * state.p.dot(&theta_dot))
    }

    /// `V = −m g L (5/2 cos θ1 + 3/2 cos θ2 + 1/2 cos θ3)`, zero at the pivot height
    pub fn potential_energy(&self, state: &StateVector) -> f64 {
        let th = &state.theta;
        -self.params.gravity_scale() * (2.5 * th.x.cos() + 1.5 * th.y.cos() + 0.5 * th.z.cos())
    }

    /// Hamiltonian `H = T + V`
    pub fn total_energy(&self, state: &StateVector) -> Result<f64, SimError> {
        Ok(self.kinetic_energy(state)? + self.potential_energy(state))
    }
}

impl Dynamics for DynamicsModel {
    fn derivative(&self, state: &StateVector) -> Result<DerivativeVector, SimError> {
        let th = &state.theta;

        // bails out before any NaN velocity can reach the momentum terms
        let w = self.angular_velocities(state)?;

        let s12 = (th.x - th.y).sin();
        let s13 = (th.x - th.z).sin();
        let s23 = (th.y - th.z).sin();

        let ml2 = self.params.inertia_scale();
        let mgl = self.params.gravity_scale();

        let w12 = w.x * w.y * s12;
        let w13 = w.x * w.z * s13;
        let w23 = w.y * w.z * s23;

        let p_dot = NVec3::new(
            -1.5 * ml2 * w12 - 0.5 * ml2 * w13 - 2.5 * mgl * th.x.sin(),
            1.5 * ml2 * w12 - 0.5 * ml2 * w23 - 1.5 * mgl * th.y.sin(),
            0.5 * ml2 * w13 + 0.5 * ml2 * w23 - 0.5 * mgl * th.z.sin(),
        );

        let d = DerivativeVector { theta_dot: w, p_dot };
        if !d.is_finite() {
            return Err(SimError::singularity(format!(
                "non-finite derivative {:?} at state {:?}",
                d.to_array(),
                state.to_array()
            )));
        }
        Ok(d)
    }
}
