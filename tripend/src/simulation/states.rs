//! Core state types for the triple pendulum.
//!
//! - `StateVector`      angles and conjugate momenta `(θ1, θ2, θ3, p1, p2, p3)`
//! - `DerivativeVector` the instantaneous rate of change of a `StateVector`
//! - `TimeGridSpec`     the output sampling grid `[t0, t1]` with `num_samples` points
//!
//! Angles are never wrapped; a pendulum that loops twice ends up near `4π`.

use std::ops::{Add, Mul};

use nalgebra::{Vector2, Vector3};

use crate::error::SimError;

pub type NVec2 = Vector2<f64>;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub theta: NVec3, // link angles from the downward vertical
    pub p: NVec3,     // generalized momenta
}

impl StateVector {
    pub fn new(theta: [f64; 3], p: [f64; 3]) -> Self {
        Self {
            theta: NVec3::from(theta),
            p: NVec3::from(p),
        }
    }

    /// All angles and momenta zero: hanging straight down, not moving
    pub fn at_rest() -> Self {
        Self {
            theta: NVec3::zeros(),
            p: NVec3::zeros(),
        }
    }

    /// New state `self + h * d`. The receiver is left untouched.
    pub fn advanced(&self, d: &DerivativeVector, h: f64) -> Self {
        Self {
            theta: self.theta + d.theta_dot * h,
            p: self.p + d.p_dot * h,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.theta.iter().chain(self.p.iter()).all(|v| v.is_finite())
    }

    /// Flat `[θ1, θ2, θ3, p1, p2, p3]`
    pub fn to_array(&self) -> [f64; 6] {
        [self.theta.x, self.theta.y, self.theta.z, self.p.x, self.p.y, self.p.z]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeVector {
    pub theta_dot: NVec3, // angular velocities
    pub p_dot: NVec3,     // generalized forces
}

impl DerivativeVector {
    pub fn zeros() -> Self {
        Self {
            theta_dot: NVec3::zeros(),
            p_dot: NVec3::zeros(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.theta_dot.iter().chain(self.p_dot.iter()).all(|v| v.is_finite())
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.theta_dot.x,
            self.theta_dot.y,
            self.theta_dot.z,
            self.p_dot.x,
            self.p_dot.y,
            self.p_dot.z,
        ]
    }
}

impl Add for DerivativeVector {
    type Output = DerivativeVector;

    fn add(self, rhs: DerivativeVector) -> DerivativeVector {
        DerivativeVector {
            theta_dot: self.theta_dot + rhs.theta_dot,
            p_dot: self.p_dot + rhs.p_dot,
        }
    }
}

impl Mul<f64> for DerivativeVector {
    type Output = DerivativeVector;

    fn mul(self, s: f64) -> DerivativeVector {
        DerivativeVector {
            theta_dot: self.theta_dot * s,
            p_dot: self.p_dot * s,
        }
    }
}

/// Output sampling grid. Sample `i` sits at `t0 + i * dt`, `dt = (t1 - t0) / (n - 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGridSpec {
    pub t0: f64,
    pub t1: f64,
    pub num_samples: usize,
}

impl TimeGridSpec {
    pub fn new(t0: f64, t1: f64, num_samples: usize) -> Result<Self, SimError> {
        let grid = Self { t0, t1, num_samples };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.t0.is_finite() || !self.t1.is_finite() {
            return Err(SimError::invalid_time_grid(format!(
                "bounds must be finite, got [{}, {}]",
                self.t0, self.t1
            )));
        }
        if self.t1 <= self.t0 {
            return Err(SimError::invalid_time_grid(format!(
                "t1 ({}) must be greater than t0 ({})",
                self.t1, self.t0
            )));
        }
        if self.num_samples < 2 {
            return Err(SimError::invalid_time_grid(format!(
                "need at least 2 samples, got {}",
                self.num_samples
            )));
        }
        Ok(())
    }

    /// Spacing between consecutive samples
    pub fn dt(&self) -> f64 {
        (self.t1 - self.t0) / (self.num_samples - 1) as f64
    }

    /// Time of sample `i`. The last sample is pinned to `t1` exactly.
    pub fn sample_time(&self, i: usize) -> f64 {
        if i + 1 >= self.num_samples {
            self.t1
        } else {
            self.t0 + i as f64 * self.dt()
        }
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.num_samples).map(move |i| self.sample_time(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advanced_returns_new_state() {
        let s = StateVector::new([1.0, 2.0, 3.0], [0.0, 0.0, 0.0]);
        let d = DerivativeVector {
            theta_dot: NVec3::new(1.0, 1.0, 1.0),
            p_dot: NVec3::new(-2.0, 0.0, 2.0),
        };
        let next = s.advanced(&d, 0.5);
        assert_eq!(next.to_array(), [1.5, 2.5, 3.5, -1.0, 0.0, 1.0]);
        assert_eq!(s.to_array(), [1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn derivative_arithmetic() {
        let a = DerivativeVector {
            theta_dot: NVec3::new(1.0, 2.0, 3.0),
            p_dot: NVec3::new(4.0, 5.0, 6.0),
        };
        let sum = a + a * 2.0;
        assert_eq!(sum.to_array(), [3.0, 6.0, 9.0, 12.0, 15.0, 18.0]);
    }

    #[test]
    fn non_finite_state_detected() {
        let mut s = StateVector::at_rest();
        assert!(s.is_finite());
        s.p.y = f64::NAN;
        assert!(!s.is_finite());
    }

    #[test]
    fn grid_matches_linspace() {
        let grid = TimeGridSpec::new(0.0, 20.0, 800).unwrap();
        assert_eq!(grid.sample_time(0), 0.0);
        assert_eq!(grid.sample_time(799), 20.0);
        assert!((grid.dt() - 20.0 / 799.0).abs() < 1e-15);
        let times: Vec<f64> = grid.times().collect();
        assert_eq!(times.len(), 800);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn grid_rejects_bad_bounds() {
        assert!(TimeGridSpec::new(1.0, 1.0, 10).is_err());
        assert!(TimeGridSpec::new(2.0, 1.0, 10).is_err());
        assert!(TimeGridSpec::new(0.0, 1.0, 1).is_err());
        assert!(TimeGridSpec::new(0.0, f64::INFINITY, 10).is_err());
    }
}
