// src/lib.rs
// Two-link planar pendulum with unilateral joint-limit contacts: free-swing equations of motion,
// constraint evaluation and the velocity-jump impact map, generic over a numeric or symbolic
// evaluator. The core modules are pure; `config` and `ui` are the only ones that touch I/O.

pub mod config;
pub mod constraint;
pub mod error;
pub mod expr;
pub mod impact;
pub mod logic;
pub mod math;
pub mod observe;
pub mod params;
pub mod ui;

pub use config::SimConfig;
pub use constraint::{constraint_jacobian, constraint_value, output, ActiveSet};
pub use error::{DynamicsError, DynamicsResult};
pub use expr::Expr;
pub use impact::{apply_impact, impact_projector, ImpactOutcome};
pub use logic::{acceleration, acceleration_with, coriolis_matrix, mass_matrix, state_derivative, Context};
pub use math::{DynScalar, Evaluator, Numeric, SolveMode, Symbolic};
pub use observe::{link_geometry, observe, LinkGeometry, Observation};
pub use params::{simultaneous_impact_configuration, simultaneous_impact_velocity, PhysicalParameters};
