// src/constraint.rs
// Unilateral constraints. Contact 0 keeps θ0 on its side of zero; contact 1 stops link 1 at the
// contact angle arccos(-d/b). A negative value means the contact has been penetrated.

use nalgebra::{DMatrix, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::DynamicsResult;
use crate::math::DynScalar;
use crate::params::PhysicalParameters;

/// Which of the two contacts take part in the Jacobian / impact computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[bool; 2]", into = "[bool; 2]")]
pub struct ActiveSet([bool; 2]);

impl ActiveSet {
    pub const NONE: ActiveSet = ActiveSet([false, false]);
    pub const BOTH: ActiveSet = ActiveSet([true, true]);

    pub fn new(contact0: bool, contact1: bool) -> Self {
        Self([contact0, contact1])
    }

    /// Contacts whose constraint value has gone negative.
    pub fn penetrated(a: &Vector2<f64>) -> Self {
        Self([a[0] < 0.0, a[1] < 0.0])
    }

    pub fn is_active(&self, contact: usize) -> bool {
        self.0.get(contact).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&on| on).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl From<[bool; 2]> for ActiveSet {
    fn from(flags: [bool; 2]) -> Self {
        Self(flags)
    }
}

impl From<ActiveSet> for [bool; 2] {
    fn from(set: ActiveSet) -> Self {
        set.0
    }
}

/// Constraint vector `a = [q0, -q1 + arccos(-d/b)]`.
pub fn constraint_value<S: DynScalar>(
    q: &Vector2<S>,
    params: &PhysicalParameters,
) -> DynamicsResult<Vector2<S>> {
    let contact_angle = S::from(params.contact_angle()?);
    Ok(Vector2::new(q[0].clone(), -q[1].clone() + contact_angle))
}

/// Jacobian of the active constraints: row `[1, 0]` for contact 0, `[0, -1]` for contact 1,
/// always in contact order. With nothing active the result is 0 x len(q), not shapeless.
pub fn constraint_jacobian<S: DynScalar>(q: &Vector2<S>, active: ActiveSet) -> DMatrix<S> {
    let ncols = q.len();
    let mut rows: Vec<S> = Vec::with_capacity(2 * ncols);
    if active.is_active(0) {
        rows.extend([S::from(1.0), S::from(0.0)]);
    }
    if active.is_active(1) {
        rows.extend([S::from(0.0), S::from(-1.0)]);
    }
    DMatrix::from_row_slice(rows.len() / ncols, ncols, &rows)
}

/// General output map, currently the constraint vector.
pub fn output<S: DynScalar>(q: &Vector2<S>, params: &PhysicalParameters) -> DynamicsResult<Vector2<S>> {
    constraint_value(q, params)
}
