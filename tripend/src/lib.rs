pub mod error;
pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use error::{RunFailure, SimError};

pub use simulation::states::{StateVector, DerivativeVector, TimeGridSpec, NVec2, NVec3};
pub use simulation::params::PhysicalParameters;
pub use simulation::mass_matrix::{Cosines, MassMatrixInverter, DEFAULT_SINGULARITY_EPSILON};
pub use simulation::dynamics::{Dynamics, DynamicsModel};
pub use simulation::kinematics::{forward_kinematics, CartesianFrame};
pub use simulation::trajectory::{TrajectoryBuffer, TrajectoryRecord, TrajectorySample, RunStats};
pub use simulation::engine::{Engine, SchemeSettings};
pub use simulation::integrator::{CancelToken, CashKarp45, Integrator, Rk4, StepOutcome, StepScheme};
pub use simulation::scenario::Scenario;
pub use simulation::batch::{run_batch, run_batch_with_cancel};

pub use configuration::config::{IntegratorConfig, InitialConfig, ParametersConfig, SchemeConfig, ScenarioConfig, TimeConfig};

pub use benchmark::benchmark::{bench_schemes, bench_scenario, reference_state};
