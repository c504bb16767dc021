//! Time integrators for the pendulum state
//!
//! Provides a fixed-step classical RK4 and an embedded Cash–Karp 4(5) scheme,
//! both behind `StepScheme`, plus the driver that walks them across a
//! `TimeGridSpec` and fills a `TrajectoryBuffer`.
//!
//! Sample times are authoritative: however many internal steps are taken, the
//! recorded state always sits exactly on the requested grid time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::dynamics::Dynamics;
use super::engine::{Engine, SchemeSettings};
use super::states::{StateVector, TimeGridSpec};
use super::trajectory::TrajectoryBuffer;
use crate::error::{RunFailure, SimError};

/// Result of a single step attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub state: StateVector,
    pub error: Option<f64>, // local error estimate, if the scheme has one
    pub evaluations: usize, // derivative evaluations spent
}

/// A one-step method `state -> state'` over `dt`
///
/// Implementations never mutate the input state; a failed derivative
/// evaluation aborts the step as a whole.
pub trait StepScheme {
    fn step(&self, dynamics: &dyn Dynamics, state: &StateVector, dt: f64) -> Result<StepOutcome, SimError>;
}

/// Classical 4th-order Runge–Kutta
///
/// ```text
/// k1 = f(y)
/// k2 = f(y + h/2 k1)
/// k3 = f(y + h/2 k2)
/// k4 = f(y + h k3)
/// y' = y + h/6 (k1 + 2 k2 + 2 k3 + k4)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl StepScheme for Rk4 {
    fn step(&self, dynamics: &dyn Dynamics, state: &StateVector, dt: f64) -> Result<StepOutcome, SimError> {
        let half = 0.5 * dt;

        let k1 = dynamics.derivative(state)?;
        let k2 = dynamics.derivative(&state.advanced(&k1, half))?;
        let k3 = dynamics.derivative(&state.advanced(&k2, half))?;
        let k4 = dynamics.derivative(&state.advanced(&k3, dt))?;

        let slope = (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (1.0 / 6.0);

        Ok(StepOutcome {
            state: state.advanced(&slope, dt),
            error: None,
            evaluations: 4,
        })
    }
}

/// Cash–Karp embedded Runge–Kutta 4(5)
///
/// Advances with the 5th-order solution and reports the difference to the
/// embedded 4th-order one as the local error, scaled per component by
/// `1 + |y|` so it behaves as absolute error near zero and relative error
/// for large angles/momenta.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashKarp45;

impl CashKarp45 {
    const A2: f64 = 1.0 / 5.0;
    const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
    const A4: [f64; 3] = [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0];
    const A5: [f64; 4] = [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0];
    const A6: [f64; 5] = [1631.0 / 55296.0, 175.0 / 512.0, 575.0 / 13824.0, 44275.0 / 110592.0, 253.0 / 4096.0];

    const B5: [f64; 6] = [37.0 / 378.0, 0.0, 250.0 / 621.0, 125.0 / 594.0, 0.0, 512.0 / 1771.0];
    const B4: [f64; 6] = [2825.0 / 27648.0, 0.0, 18575.0 / 48384.0, 13525.0 / 55296.0, 277.0 / 14336.0, 1.0 / 4.0];
}

impl StepScheme for CashKarp45 {
    fn step(&self, dynamics: &dyn Dynamics, state: &StateVector, dt: f64) -> Result<StepOutcome, SimError> {
        let k1 = dynamics.derivative(state)?;

        let k2 = dynamics.derivative(&state.advanced(&(k1 * Self::A2), dt))?;

        let [a, b] = Self::A3;
        let k3 = dynamics.derivative(&state.advanced(&(k1 * a + k2 * b), dt))?;

        let [a, b, c] = Self::A4;
        let k4 = dynamics.derivative(&state.advanced(&(k1 * a + k2 * b + k3 * c), dt))?;

        let [a, b, c, d] = Self::A5;
        let k5 = dynamics.derivative(&state.advanced(&(k1 * a + k2 * b + k3 * c + k4 * d), dt))?;

        let [a, b, c, d, e] = Self::A6;
        let k6 = dynamics.derivative(&state.advanced(&(k1 * a + k2 * b + k3 * c + k4 * d + k5 * e), dt))?;

        let ks = [k1, k2, k3, k4, k5, k6];
        let combine = |w: &[f64; 6]| {
            ks.iter()
                .zip(w.iter())
                .skip(1)
                .fold(ks[0] * w[0], |acc, (k, wi)| acc + *k * *wi)
        };

        let fifth = state.advanced(&combine(&Self::B5), dt);
        let fourth = state.advanced(&combine(&Self::B4), dt);

        let error = fifth
            .to_array()
            .iter()
            .zip(fourth.to_array().iter())
            .map(|(y5, y4)| (y5 - y4).abs() / (1.0 + y5.abs()))
            .fold(0.0_f64, |m, e| if e.is_nan() { f64::INFINITY } else { m.max(e) });

        Ok(StepOutcome {
            state: fifth,
            error: Some(error),
            evaluations: 6,
        })
    }
}

/// Cooperative cancellation flag, shared between a run and whoever may stop it
///
/// Checked only between completed steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives a `StepScheme` across a sampling grid
#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator {
    pub engine: Engine,
}

impl Integrator {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Integrate from `initial` at `grid.t0` and record every grid sample
    ///
    /// `link_length` is stored in the buffer so records can carry Cartesian
    /// frames. On a mid-run failure the samples recorded so far come back in
    /// the `RunFailure`.
    ///
    /// `dynamics` is used as given: the engine's `singularity_epsilon` only
    /// takes effect through a model built with `Engine::dynamics`.
    pub fn integrate(
        &self,
        dynamics: &dyn Dynamics,
        initial: &StateVector,
        grid: &TimeGridSpec,
        link_length: f64,
        cancel: Option<&CancelToken>,
    ) -> Result<TrajectoryBuffer, RunFailure> {
        self.engine.validate().map_err(RunFailure::before_start)?;
        grid.validate().map_err(RunFailure::before_start)?;
        if !initial.is_finite() {
            return Err(RunFailure::before_start(SimError::singularity(format!(
                "initial state is not finite: {:?}",
                initial.to_array()
            ))));
        }

        debug!(
            scheme = self.engine.name(),
            samples = grid.num_samples,
            t0 = grid.t0,
            t1 = grid.t1,
            "starting pendulum run"
        );

        let mut buf = TrajectoryBuffer::new(link_length, grid.num_samples);
        buf.push(grid.t0, *initial);

        let result = match self.engine.scheme {
            SchemeSettings::Rk4 { max_step } => {
                let mut walker = FixedWalker { scheme: &Rk4, max_step };
                walk(&mut walker, dynamics, initial, grid, cancel, &mut buf)
            }
            SchemeSettings::Adaptive { tolerance, min_step, max_step, max_step_retries } => {
                let h_max = max_step.unwrap_or_else(|| grid.dt());
                let mut walker = AdaptiveWalker {
                    scheme: &CashKarp45,
                    tolerance,
                    min_step,
                    h_max,
                    max_step_retries,
                    h: h_max,
                };
                walk(&mut walker, dynamics, initial, grid, cancel, &mut buf)
            }
        };

        match result {
            Ok(()) => {
                info!(
                    samples = buf.len(),
                    steps = buf.stats.steps,
                    rejected = buf.stats.rejected_steps,
                    evaluations = buf.stats.evaluations,
                    "pendulum run complete"
                );
                Ok(buf)
            }
            Err(error) => {
                warn!(%error, recorded = buf.len(), "pendulum run aborted");
                Err(RunFailure::new(error, buf))
            }
        }
    }
}

// Advances `state` from `t` to exactly `t_target`, updating run stats.
trait IntervalWalker {
    fn advance(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &mut StateVector,
        t: f64,
        t_target: f64,
        cancel: Option<&CancelToken>,
        buf: &mut TrajectoryBuffer,
    ) -> Result<(), SimError>;
}

fn walk(
    walker: &mut dyn IntervalWalker,
    dynamics: &dyn Dynamics,
    initial: &StateVector,
    grid: &TimeGridSpec,
    cancel: Option<&CancelToken>,
    buf: &mut TrajectoryBuffer,
) -> Result<(), SimError> {
    let mut state = *initial;
    let mut t = grid.t0;

    for i in 1..grid.num_samples {
        check_cancel(cancel, t)?;

        let t_target = grid.sample_time(i);
        walker.advance(dynamics, &mut state, t, t_target, cancel, buf)?;

        if !state.is_finite() {
            return Err(SimError::singularity(format!("non-finite state at t = {t_target}")));
        }
        buf.push(t_target, state);
        t = t_target;
    }
    Ok(())
}

fn check_cancel(cancel: Option<&CancelToken>, t: f64) -> Result<(), SimError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(SimError::Cancelled { t }),
        _ => Ok(()),
    }
}

struct FixedWalker<'a> {
    scheme: &'a dyn StepScheme,
    max_step: Option<f64>,
}

impl IntervalWalker for FixedWalker<'_> {
    fn advance(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &mut StateVector,
        t: f64,
        t_target: f64,
        cancel: Option<&CancelToken>,
        buf: &mut TrajectoryBuffer,
    ) -> Result<(), SimError> {
        let span = t_target - t;
        let substeps = match self.max_step {
            // slack keeps grid rounding from adding a near-empty substep
            Some(h) => (span / h - 1e-9).ceil().max(1.0) as usize,
            None => 1,
        };
        let h = span / substeps as f64;

        for k in 0..substeps {
            if k > 0 {
                check_cancel(cancel, t + k as f64 * h)?;
            }
            let out = self.scheme.step(dynamics, state, h)?;
            *state = out.state;
            buf.stats.steps += 1;
            buf.stats.evaluations += out.evaluations;
        }
        Ok(())
    }
}

struct AdaptiveWalker<'a> {
    scheme: &'a dyn StepScheme,
    tolerance: f64,
    min_step: f64,
    h_max: f64,
    max_step_retries: usize,
    h: f64, // carried across sample intervals
}

impl IntervalWalker for AdaptiveWalker<'_> {
    fn advance(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &mut StateVector,
        t: f64,
        t_target: f64,
        cancel: Option<&CancelToken>,
        buf: &mut TrajectoryBuffer,
    ) -> Result<(), SimError> {
        let mut t = t;
        let mut retries = 0;

        while t < t_target {
            let remaining = t_target - t;
            let lands = self.h >= remaining;
            let h_try = if lands { remaining } else { self.h };
            if !lands && t + h_try <= t {
                return Err(SimError::StepSizeUnderflow { t, dt: h_try });
            }

            let out = self.scheme.step(dynamics, state, h_try)?;
            buf.stats.evaluations += out.evaluations;
            let err = out.error.unwrap_or(0.0);

            if err <= self.tolerance && out.state.is_finite() {
                *state = out.state;
                t = if lands { t_target } else { t + h_try };
                buf.stats.steps += 1;
                retries = 0;

                // grow only when the full step was used and the error is well under tolerance
                if !lands && err < self.tolerance / 32.0 {
                    self.h = (self.h * 2.0).min(self.h_max);
                }

                if t < t_target {
                    check_cancel(cancel, t)?;
                }
            } else {
                buf.stats.rejected_steps += 1;
                retries += 1;
                self.h = h_try * 0.5;
                trace!(t, h = self.h, err, "step rejected, halving");

                if self.h < self.min_step || retries > self.max_step_retries {
                    return Err(SimError::StepSizeUnderflow { t, dt: self.h });
                }
            }
        }
        Ok(())
    }
}
