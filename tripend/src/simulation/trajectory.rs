//! Ordered simulation output
//!
//! A `TrajectoryBuffer` holds one `(t, StateVector)` pair per requested sample,
//! strictly increasing in `t`. Only the integrator appends to it; callers get it
//! back read-only and iterate `records()` to obtain the Cartesian frames.

use super::dynamics::DynamicsModel;
use super::kinematics::{forward_kinematics, CartesianFrame};
use super::states::StateVector;
use crate::error::SimError;

// upfront reservation cap; larger grids grow the buffer as samples arrive
const MAX_RESERVED_SAMPLES: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub t: f64,
    pub state: StateVector,
}

/// Work done by the integrator over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub steps: usize,          // accepted internal steps
    pub rejected_steps: usize, // adaptive rejections
    pub evaluations: usize,    // derivative evaluations
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryBuffer {
    samples: Vec<TrajectorySample>,
    link_length: f64,
    pub stats: RunStats,
}

impl Default for TrajectoryBuffer {
    // unit links; only matters once samples exist
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}

impl TrajectoryBuffer {
    pub fn new(link_length: f64, capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity.min(MAX_RESERVED_SAMPLES)),
            link_length,
            stats: RunStats::default(),
        }
    }

    /// Append a sample. Times must be strictly increasing and the state finite.
    pub(crate) fn push(&mut self, t: f64, state: StateVector) {
        debug_assert!(state.is_finite(), "non-finite state recorded at t = {t}");
        debug_assert!(
            self.samples.last().map_or(true, |last| t > last.t),
            "sample at t = {t} is not after the previous one"
        );
        self.samples.push(TrajectorySample { t, state });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn link_length(&self) -> f64 {
        self.link_length
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.t)
    }

    /// Time-ordered records with Cartesian positions attached
    pub fn records(&self) -> impl Iterator<Item = TrajectoryRecord> + '_ {
        self.samples.iter().map(move |s| TrajectoryRecord {
            t: s.t,
            state: s.state,
            frame: forward_kinematics(&s.state.theta, self.link_length),
        })
    }

    /// Largest relative deviation of the Hamiltonian from its first-sample value
    ///
    /// Falls back to absolute deviation when the initial energy is (near) zero.
    pub fn energy_drift(&self, model: &DynamicsModel) -> Result<f64, SimError> {
        let Some(first) = self.samples.first() else {
            return Ok(0.0);
        };
        let e0 = model.total_energy(&first.state)?;
        let scale = if e0.abs() > 1e-12 { e0.abs() } else { 1.0 };

        let mut worst = 0.0_f64;
        for s in &self.samples[1..] {
            let e = model.total_energy(&s.state)?;
            worst = worst.max((e - e0).abs() / scale);
        }
        Ok(worst)
    }
}

/// One output row: time, state and the derived joint positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRecord {
    pub t: f64,
    pub state: StateVector,
    pub frame: CartesianFrame,
}

impl TrajectoryRecord {
    pub fn csv_header() -> &'static str {
        "t,theta1,theta2,theta3,p1,p2,p3,bob1_x,bob1_y,bob2_x,bob2_y,bob3_x,bob3_y"
    }

    pub fn to_csv_row(&self) -> String {
        let s = self.state.to_array();
        let f = &self.frame;
        let values = [
            self.t, s[0], s[1], s[2], s[3], s[4], s[5],
            f.bob1.x, f.bob1.y, f.bob2.x, f.bob2.y, f.bob3.x, f.bob3.y,
        ];
        values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::params::PhysicalParameters;

    fn buffer() -> TrajectoryBuffer {
        let mut buf = TrajectoryBuffer::new(1.0, 3);
        buf.push(0.0, StateVector::at_rest());
        buf.push(0.5, StateVector::new([0.1, 0.0, 0.0], [0.0; 3]));
        buf.push(1.0, StateVector::new([0.2, 0.0, 0.0], [0.0; 3]));
        buf
    }

    #[test]
    fn records_follow_sample_order() {
        let buf = buffer();
        let ts: Vec<f64> = buf.records().map(|r| r.t).collect();
        assert_eq!(ts, vec![0.0, 0.5, 1.0]);
        let first = buf.records().next().unwrap();
        assert_eq!(first.frame.bob3.y, -3.0);
    }

    #[test]
    fn reservation_is_capped() {
        let buf = TrajectoryBuffer::new(1.0, usize::MAX / 8);
        assert!(buf.samples.capacity() <= MAX_RESERVED_SAMPLES);
        assert!(TrajectoryBuffer::new(1.0, 800).samples.capacity() >= 800);
    }

    #[test]
    fn csv_row_has_all_columns() {
        let buf = buffer();
        let header_cols = TrajectoryRecord::csv_header().split(',').count();
        for r in buf.records() {
            assert_eq!(r.to_csv_row().split(',').count(), header_cols);
        }
        assert_eq!(header_cols, 13);
    }

    #[test]
    fn energy_drift_of_static_buffer_is_zero() {
        let model = DynamicsModel::new(PhysicalParameters::default());
        let mut buf = TrajectoryBuffer::new(1.0, 2);
        buf.push(0.0, StateVector::at_rest());
        buf.push(1.0, StateVector::at_rest());
        assert_eq!(buf.energy_drift(&model).unwrap(), 0.0);
        assert_eq!(TrajectoryBuffer::default().energy_drift(&model).unwrap(), 0.0);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn out_of_order_push_panics_in_debug() {
        let mut buf = buffer();
        buf.push(0.25, StateVector::at_rest());
    }
}
