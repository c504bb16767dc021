//! Physical constants for a pendulum run
//!
//! `PhysicalParameters` holds the three scalars shared by every link:
//! - `g` gravitational acceleration,
//! - `L` link length,
//! - `m` link mass.
//!
//! A value is validated once and then passed by reference into every
//! computation; nothing about the physics lives in globals.

use crate::error::SimError;

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParameters {
    pub g: f64, // gravitational acceleration
    pub L: f64, // length of each link
    pub m: f64, // mass of each link
}

#[allow(non_snake_case)]
impl PhysicalParameters {
    /// Build and validate a parameter set
    pub fn new(g: f64, L: f64, m: f64) -> Result<Self, SimError> {
        let p = Self { g, L, m };
        p.validate()?;
        Ok(p)
    }

    /// `L` and `m` must be positive and finite, `g` finite and non-negative
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.L.is_finite() && self.L > 0.0) {
            return Err(SimError::invalid_parameters(format!("L must be positive and finite, got {}", self.L)));
        }
        if !(self.m.is_finite() && self.m > 0.0) {
            return Err(SimError::invalid_parameters(format!("m must be positive and finite, got {}", self.m)));
        }
        if !(self.g.is_finite() && self.g >= 0.0) {
            return Err(SimError::invalid_parameters(format!("g must be finite and non-negative, got {}", self.g)));
        }
        Ok(())
    }

    /// `m L²`, the inertia scale of one link
    pub fn inertia_scale(&self) -> f64 {
        self.m * self.L * self.L
    }

    /// `m g L`, the gravity torque scale of one link
    pub fn gravity_scale(&self) -> f64 {
        self.m * self.g * self.L
    }
}

impl Default for PhysicalParameters {
    // Earth gravity, unit rods
    fn default() -> Self {
        Self { g: 9.8, L: 1.0, m: 1.0 }
    }
}
