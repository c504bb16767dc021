pub mod states;
pub mod params;
pub mod mass_matrix;
pub mod dynamics;
pub mod kinematics;
pub mod trajectory;
pub mod engine;
pub mod integrator;
pub mod scenario;
pub mod batch;
