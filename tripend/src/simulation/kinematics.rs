//! Forward kinematics: link angles to Cartesian bob positions
//!
//! Each link hangs from the end of the previous one, so
//! `bob_k = bob_{k-1} + L (sin θk, −cos θk)` starting from the pivot at the origin.
//! NaN angles come out as NaN positions; there is no failure path here.

use super::states::{NVec2, NVec3};

/// Pivot plus the three bob positions for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianFrame {
    pub pivot: NVec2,
    pub bob1: NVec2,
    pub bob2: NVec2,
    pub bob3: NVec2,
}

impl CartesianFrame {
    /// Polyline pivot → bob1 → bob2 → bob3, the order a renderer draws it in
    pub fn points(&self) -> [NVec2; 4] {
        [self.pivot, self.bob1, self.bob2, self.bob3]
    }

    pub fn is_finite(&self) -> bool {
        self.points().iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

/// Map angles to joint positions for links of length `l`
pub fn forward_kinematics(theta: &NVec3, l: f64) -> CartesianFrame {
    let pivot = NVec2::zeros();
    let bob1 = pivot + link(theta.x, l);
    let bob2 = bob1 + link(theta.y, l);
    let bob3 = bob2 + link(theta.z, l);

    CartesianFrame { pivot, bob1, bob2, bob3 }
}

// one link's offset from its hinge
fn link(angle: f64, l: f64) -> NVec2 {
    NVec2::new(l * angle.sin(), -l * angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn hanging_straight_down() {
        let f = forward_kinematics(&NVec3::zeros(), 2.0);
        assert_eq!(f.pivot, NVec2::zeros());
        assert_relative_eq!(f.bob1, NVec2::new(0.0, -2.0));
        assert_relative_eq!(f.bob2, NVec2::new(0.0, -4.0));
        assert_relative_eq!(f.bob3, NVec2::new(0.0, -6.0));
    }

    #[test]
    fn reference_start_configuration() {
        let f = forward_kinematics(&NVec3::new(PI - 0.1, -PI / 2.0, -PI / 2.0), 1.0);
        assert_relative_eq!(f.bob1.x, 0.0998, epsilon = 1e-4);
        assert_relative_eq!(f.bob1.y, 0.9950, epsilon = 1e-4);
        assert_relative_eq!(f.bob2.x, f.bob1.x - 1.0, epsilon = 1e-12);
        assert_relative_eq!(f.bob3.x, f.bob1.x - 2.0, epsilon = 1e-12);
        assert_relative_eq!(f.bob3.y, f.bob1.y, epsilon = 1e-12);
    }

    #[test]
    fn links_keep_their_length() {
        let l = 0.75;
        let f = forward_kinematics(&NVec3::new(0.3, 2.1, -4.0), l);
        let [p0, p1, p2, p3] = f.points();
        assert_relative_eq!((p1 - p0).norm(), l, epsilon = 1e-12);
        assert_relative_eq!((p2 - p1).norm(), l, epsilon = 1e-12);
        assert_relative_eq!((p3 - p2).norm(), l, epsilon = 1e-12);
    }

    #[test]
    fn nan_propagates() {
        let f = forward_kinematics(&NVec3::new(0.0, f64::NAN, 0.0), 1.0);
        assert!(f.bob1.x.is_finite());
        assert!(f.bob2.x.is_nan());
        assert!(f.bob3.y.is_nan());
        assert!(!f.is_finite());
    }
}
