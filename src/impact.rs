// src/impact.rs
// Impact map for the unilateral contacts. At a detected zero crossing of a(q) the velocity jumps
// through Δ = I + (1+γ)·M⁻¹·Daᵗ·Λ·Da with Λ = -(Da·M⁻¹·Daᵗ)⁻¹; the configuration does not move.
// γ = 1 reflects the approach velocity along the active directions, γ = 0 cancels it.

use nalgebra::{DMatrix, Matrix2, Vector2};
use tracing::debug;

use crate::constraint::{constraint_jacobian, constraint_value, ActiveSet};
use crate::error::{DynamicsError, DynamicsResult};
use crate::logic::{mass_matrix, Context};
use crate::math::Evaluator;
use crate::params::PhysicalParameters;

/// State after an impact.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactOutcome<S: nalgebra::Scalar> {
    pub q: Vector2<S>,
    pub dq: Vector2<S>,
    /// Copy of the active set passed in. Not recomputed from the impact.
    pub active: ActiveSet,
    /// Contacts that were penetrated and therefore built the projector.
    pub impact_active: ActiveSet,
}

/// Velocity projector Δ for the given active contacts.
///
/// Fails with `DegenerateContactJacobian` when no contact is active or `Da·M⁻¹·Daᵗ` is singular.
pub fn impact_projector<E: Evaluator>(
    eval: &E,
    q: &Vector2<E::Scalar>,
    active: ActiveSet,
    params: &PhysicalParameters,
) -> DynamicsResult<Matrix2<E::Scalar>> {
    let degenerate = DynamicsError::DegenerateContactJacobian {
        active: active.count(),
    };
    if active.is_empty() {
        return Err(degenerate);
    }

    let n = q.len();
    let m_inv = eval
        .invert2(&mass_matrix(eval, q, params))
        .map_err(|_| DynamicsError::SingularMassMatrix)?;
    let m_inv = DMatrix::from_iterator(n, n, m_inv.iter().cloned());

    let da = constraint_jacobian(q, active);
    let da_t = da.transpose();

    // contact-space inverse effective mass
    let contact_mass = &da * &m_inv * &da_t;
    let lambda = -eval.invert(&contact_mass).map_err(|_| degenerate)?;

    let gain = E::Scalar::from(1.0 + params.gamma());
    let correction = m_inv.map(|v| gain.clone() * v) * da_t * lambda * da;
    let delta = DMatrix::identity(n, n) + correction;
    Ok(Matrix2::from_iterator(delta.iter().cloned()))
}

/// Non-plastic impact law.
///
/// The contacts used for Δ are the ones whose constraint value is negative at `q`. When none is,
/// the Jacobian is empty and the velocity passes through unchanged. The returned `active` is the
/// input set, untouched; `impact_active` carries the set that was actually used.
pub fn apply_impact<E: Evaluator>(
    eval: &E,
    ctx: Context,
    q: &Vector2<E::Scalar>,
    dq: &Vector2<E::Scalar>,
    active: ActiveSet,
    params: &PhysicalParameters,
) -> DynamicsResult<ImpactOutcome<E::Scalar>> {
    let a = constraint_value(q, params)?;
    let a = Vector2::new(
        eval.to_f64(&a[0]).ok_or(DynamicsError::NonNumericConstraint)?,
        eval.to_f64(&a[1]).ok_or(DynamicsError::NonNumericConstraint)?,
    );
    let impact_active = ActiveSet::penetrated(&a);

    let dq_post = if impact_active.is_empty() {
        debug!(t = ctx.t, k = ctx.k, "impact requested without penetrated contacts");
        dq.clone()
    } else {
        let delta = impact_projector(eval, q, impact_active, params)?;
        delta * dq
    };

    debug!(
        t = ctx.t,
        k = ctx.k,
        contacts = impact_active.count(),
        a0 = a[0],
        a1 = a[1],
        "impact applied"
    );

    Ok(ImpactOutcome {
        q: q.clone(),
        dq: dq_post,
        active,
        impact_active,
    })
}
