// src/error.rs
// Error kinds for the pendulum dynamics core. Every failure here is deterministic and
// input-driven, so nothing is retried: errors go straight back to the caller.

use thiserror::Error;

/// Unified error type for the impact pendulum.
#[derive(Debug, Error)]
pub enum DynamicsError {
    /// Non-positive or non-finite mass, length or restitution value.
    #[error("Invalid physical parameters: {0}")]
    InvalidPhysicalParameters(String),

    /// `|d/b| > 1`: the contact angle `arccos(-d/b)` does not exist.
    #[error("Invalid contact geometry: |d/b| = {ratio} exceeds 1")]
    InvalidContactGeometry { ratio: f64 },

    /// The mass matrix could not be inverted.
    #[error("Mass matrix is singular")]
    SingularMassMatrix,

    /// A generic square matrix handed to an evaluator could not be inverted.
    #[error("Singular {size}x{size} matrix")]
    SingularMatrix { size: usize },

    /// `Da · M⁻¹ · Daᵗ` is not invertible (rank-deficient or empty Jacobian).
    #[error("Degenerate contact Jacobian ({active} active contacts)")]
    DegenerateContactJacobian { active: usize },

    /// A symbolic constraint value did not reduce to a number, so its sign is unknown.
    #[error("Constraint value is not numeric; cannot decide which contacts are active")]
    NonNumericConstraint,

    /// A result that should be a number is still an unevaluated expression.
    #[error("Value is not numeric: {0}")]
    NonNumericValue(String),

    /// A symbol was evaluated without a binding.
    #[error("Unbound symbol: {0}")]
    UnboundSymbol(String),

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O failure while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, DynamicsError>`.
pub type DynamicsResult<T> = Result<T, DynamicsError>;
