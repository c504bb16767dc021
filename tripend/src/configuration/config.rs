//! Configuration types for loading pendulum scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`ParametersConfig`] – physical constants `g`, `L`, `m`
//! - [`InitialConfig`]    – starting angles and momenta
//! - [`TimeConfig`]       – output sampling grid
//! - [`IntegratorConfig`] – stepping scheme and its numerical bounds
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//!
//! ```yaml
//! parameters:
//!   g: 9.8                  # gravitational acceleration
//!   L: 1.0                  # link length
//!   m: 1.0                  # link mass
//!
//! initial:
//!   theta: [3.041592653589793, -1.5707963267948966, -1.5707963267948966]
//!   p: [0.0, 0.0, 0.0]
//!
//! time:
//!   t0: 0.0
//!   t1: 20.0
//!   samples: 800
//!
//! integrator:
//!   scheme: "rk4"           # or "adaptive"
//!   max_step: 0.0025        # internal step cap, rk4 defaults to 0.0025
//!   tolerance: 1.0e-9       # required for "adaptive"
//!   min_step: 1.0e-9        # adaptive only
//!   max_step_retries: 50    # adaptive only
//!   singularity_epsilon: 1.0e-9
//! ```
//!
//! `Scenario::build_scenario` validates this and maps it onto the runtime types.

use serde::Deserialize;

/// Which stepping scheme the engine uses
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeConfig {
    #[serde(rename = "rk4")] // fixed-step classical Runge–Kutta, reproducible bit for bit
    Rk4,

    #[serde(rename = "adaptive")] // Cash–Karp 4(5) with step halving/doubling
    Adaptive,
}

/// Physical constants shared by all three links
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ParametersConfig {
    pub g: f64, // gravitational acceleration
    pub L: f64, // link length
    pub m: f64, // link mass
}

/// Initial generalized coordinates and momenta
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct InitialConfig {
    pub theta: [f64; 3], // angles from the downward vertical, radians
    #[serde(default)]
    pub p: [f64; 3], // conjugate momenta, zero if omitted
}

/// Output sampling grid
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct TimeConfig {
    #[serde(default)]
    pub t0: f64, // start time, 0 if omitted
    pub t1: f64,        // end time
    pub samples: usize, // number of recorded samples, including both ends
}

/// Integrator selection and numerical bounds
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct IntegratorConfig {
    pub scheme: SchemeConfig,
    pub max_step: Option<f64>,
    pub tolerance: Option<f64>, // local error tolerance, no default
    pub min_step: Option<f64>,
    pub max_step_retries: Option<usize>,
    pub singularity_epsilon: Option<f64>, // threshold on the mass matrix determinant
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            scheme: SchemeConfig::Rk4,
            max_step: None,
            tolerance: None,
            min_step: None,
            max_step_retries: None,
            singularity_epsilon: None,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ScenarioConfig {
    pub parameters: ParametersConfig,
    pub initial: InitialConfig,
    pub time: TimeConfig,
    #[serde(default)]
    pub integrator: IntegratorConfig,
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }
}
