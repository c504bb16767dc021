//! Closed-form inverse of the triple pendulum mass matrix
//!
//! For three identical uniform rods the kinetic energy is `½ θ̇ᵀ M θ̇` with
//!
//! ```text
//!            | 7/3      3/2 c12   1/2 c13 |
//! M = m L² · | 3/2 c12  4/3       1/2 c23 |
//!            | 1/2 c13  1/2 c23   1/3     |
//! ```
//!
//! where `cij = cos(θi - θj)`. Its inverse is `A / (m L² Δ)` with `A` the
//! scaled adjugate and `Δ` the matching scaled determinant below. Every
//! coefficient is load-bearing: changing one still yields a smooth, plausible
//! simulation of a different (wrong) mechanical system.

use nalgebra::Matrix3;

use super::params::PhysicalParameters;
use super::states::NVec3;
use crate::error::SimError;

pub type NMat3 = Matrix3<f64>;

/// Default threshold on `|Δ|` below which the matrix counts as singular
pub const DEFAULT_SINGULARITY_EPSILON: f64 = 1e-9;

/// Pairwise cosines of the link angle differences
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cosines {
    pub c12: f64,
    pub c13: f64,
    pub c23: f64,
}

impl Cosines {
    pub fn new(c12: f64, c13: f64, c23: f64) -> Self {
        Self { c12, c13, c23 }
    }

    pub fn from_angles(theta: &NVec3) -> Self {
        Self {
            c12: (theta.x - theta.y).cos(),
            c13: (theta.x - theta.z).cos(),
            c23: (theta.y - theta.z).cos(),
        }
    }
}

/// Maps generalized momenta to angular velocities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassMatrixInverter {
    pub epsilon: f64, // singularity threshold on |Δ|
}

impl Default for MassMatrixInverter {
    fn default() -> Self {
        Self { epsilon: DEFAULT_SINGULARITY_EPSILON }
    }
}

impl MassMatrixInverter {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Scaled determinant `Δ = 112 − 81c12² + 81c12c13c23 − 36c13² − 63c23²`
    pub fn delta(c: &Cosines) -> f64 {
        let Cosines { c12, c13, c23 } = *c;
        112.0 - 81.0 * c12 * c12 + 81.0 * c12 * c13 * c23 - 36.0 * c13 * c13 - 63.0 * c23 * c23
    }

    /// Scaled adjugate `A` (symmetric)
    pub fn adjugate(c: &Cosines) -> NMat3 {
        let Cosines { c12, c13, c23 } = *c;

        let a00 = 48.0 - 27.0 * c23 * c23;
        let a01 = -54.0 * c12 + 27.0 * c13 * c23;
        let a02 = 81.0 * c12 * c23 - 72.0 * c13;
        let a11 = 84.0 - 27.0 * c13 * c13;
        let a12 = 81.0 * c12 * c13 - 126.0 * c23;
        let a22 = 336.0 - 243.0 * c12 * c12;

        NMat3::new(
            a00, a01, a02,
            a01, a11, a12,
            a02, a12, a22,
        )
    }

    /// Physical mass matrix `M` for the given configuration
    pub fn mass_matrix(c: &Cosines, params: &PhysicalParameters) -> NMat3 {
        let Cosines { c12, c13, c23 } = *c;
        let m = NMat3::new(
            7.0 / 3.0,   1.5 * c12,   0.5 * c13,
            1.5 * c12,   4.0 / 3.0,   0.5 * c23,
            0.5 * c13,   0.5 * c23,   1.0 / 3.0,
        );
        m * params.inertia_scale()
    }

    /// Full inverse `M⁻¹`, or `NumericalSingularity` when `|Δ| < epsilon`
    pub fn inverse(&self, c: &Cosines, params: &PhysicalParameters) -> Result<NMat3, SimError> {
        let delta = self.checked_delta(c)?;
        Ok(Self::adjugate(c) / (params.inertia_scale() * delta))
    }

    /// Angular velocities `θ̇ = M⁻¹ p`
    pub fn inverse_apply(&self, c: &Cosines, params: &PhysicalParameters, p: &NVec3) -> Result<NVec3, SimError> {
        let delta = self.checked_delta(c)?;
        let theta_dot = (Self::adjugate(c) * p) / (params.inertia_scale() * delta);
        Ok(theta_dot)
    }

    fn checked_delta(&self, c: &Cosines) -> Result<f64, SimError> {
        let delta = Self::delta(c);
        if !delta.is_finite() || delta.abs() < self.epsilon {
            return Err(SimError::singularity(format!(
                "mass matrix determinant {delta:e} below threshold {:e} (c12 = {}, c13 = {}, c23 = {})",
                self.epsilon, c.c12, c.c13, c.c23
            )));
        }
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn inverse_reconstructs_identity_on_grid() {
        let params = PhysicalParameters { g: 9.8, L: 1.3, m: 0.7 };
        let inv = MassMatrixInverter::default();
        let steps = [-1.0, -0.6, -0.2, 0.0, 0.3, 0.7, 1.0];

        for &c12 in &steps {
            for &c13 in &steps {
                for &c23 in &steps {
                    let c = Cosines::new(c12, c13, c23);
                    if MassMatrixInverter::delta(&c).abs() < 1.0 {
                        continue;
                    }
                    let m = MassMatrixInverter::mass_matrix(&c, &params);
                    for i in 0..3 {
                        let mut e = NVec3::zeros();
                        e[i] = 1.0;
                        let v = inv.inverse_apply(&c, &params, &e).unwrap();
                        let back = m * v;
                        for j in 0..3 {
                            let want = if i == j { 1.0 } else { 0.0 };
                            assert!(
                                (back[j] - want).abs() < 1e-9,
                                "c = {:?}, column {}, row {}: {}",
                                c, i, j, back[j]
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn hanging_configuration_values() {
        let c = Cosines::from_angles(&NVec3::zeros());
        // all cosines are 1
        assert_relative_eq!(MassMatrixInverter::delta(&c), 13.0);
        let a = MassMatrixInverter::adjugate(&c);
        assert_relative_eq!(a[(0, 0)], 21.0);
        assert_relative_eq!(a[(0, 1)], -27.0);
        assert_relative_eq!(a[(0, 2)], 9.0);
        assert_relative_eq!(a[(1, 1)], 57.0);
        assert_relative_eq!(a[(1, 2)], -45.0);
        assert_relative_eq!(a[(2, 2)], 93.0);
        assert_eq!(a, a.transpose());
    }

    #[test]
    fn zero_delta_is_singular() {
        // c12 = c13 = 1 leaves -5 + 81 c23 - 63 c23², zero at the root below
        let c23 = (81.0 - 5301.0_f64.sqrt()) / 126.0;
        let c = Cosines::new(1.0, 1.0, c23);
        assert!(MassMatrixInverter::delta(&c).abs() < 1e-9);

        let err = MassMatrixInverter::default()
            .inverse_apply(&c, &PhysicalParameters::default(), &NVec3::new(1.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, SimError::NumericalSingularity { .. }));
    }

    #[test]
    fn epsilon_is_configurable() {
        let c = Cosines::from_angles(&NVec3::zeros());
        let strict = MassMatrixInverter::new(20.0);
        assert!(strict.inverse(&c, &PhysicalParameters::default()).is_err());
        assert!(MassMatrixInverter::default().inverse(&c, &PhysicalParameters::default()).is_ok());
    }

    #[test]
    fn inverse_scales_with_inertia() {
        let c = Cosines::new(0.2, -0.4, 0.9);
        let inv = MassMatrixInverter::default();
        let unit = PhysicalParameters::default();
        let heavy = PhysicalParameters { m: 2.0, L: 3.0, ..unit };
        let a = inv.inverse(&c, &unit).unwrap();
        let b = inv.inverse(&c, &heavy).unwrap();
        assert_relative_eq!(a / 18.0, b, max_relative = 1e-12);
    }
}
