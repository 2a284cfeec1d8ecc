// src/logic.rs
// Equations of motion for the free swing: mass matrix M(q), Coriolis/centrifugal matrix C(q, dq)
// and the acceleration solve of M·ddq + C·dq = 0. There is no gravity and no external force.
// Everything is generic over the Evaluator, so the same code yields numbers or closed forms.
// State is q = [θ0, θ1] (θ1 measured relative to link 0) and dq = [ω0, ω1].

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{DynamicsError, DynamicsResult};
use crate::math::{Evaluator, Numeric, SolveMode};
use crate::params::PhysicalParameters;

/// Opaque time/index context threaded through evaluations for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Context {
    pub t: f64,
    pub k: usize,
}

impl Context {
    pub fn new(t: f64, k: usize) -> Self {
        Self { t, k }
    }
}

/// Mass matrix `M = [[a + 2b cos q1, d + b cos q1], [d + b cos q1, d]]`.
/// Depends on q1 only; the off-diagonal entries are the same value, so M is exactly symmetric.
pub fn mass_matrix<E: Evaluator>(
    eval: &E,
    q: &Vector2<E::Scalar>,
    params: &PhysicalParameters,
) -> Matrix2<E::Scalar> {
    let a = E::Scalar::from(params.inertia_a());
    let b = E::Scalar::from(params.coupling_b());
    let d = E::Scalar::from(params.inertia_d());
    let cos_q1 = eval.cos(&q[1]);

    let m00 = a + E::Scalar::from(2.0) * b.clone() * cos_q1.clone();
    let m10 = d.clone() + b * cos_q1;
    Matrix2::new(m00, m10.clone(), m10, d)
}

/// Coriolis matrix `C = [[-b s ω1, -b s (ω0 + ω1)], [b s ω0, 0]]` with `s = sin q1`.
pub fn coriolis_matrix<E: Evaluator>(
    eval: &E,
    q: &Vector2<E::Scalar>,
    dq: &Vector2<E::Scalar>,
    params: &PhysicalParameters,
) -> Matrix2<E::Scalar> {
    let bs = E::Scalar::from(params.coupling_b()) * eval.sin(&q[1]);

    let c00 = -(bs.clone() * dq[1].clone());
    let c01 = -(bs.clone() * (dq[0].clone() + dq[1].clone()));
    let c10 = bs * dq[0].clone();
    Matrix2::new(c00, c01, c10, E::Scalar::from(0.0))
}

/// Generalized acceleration `ddq = M⁻¹·(-C·dq)`.
///
/// Inverts M directly instead of solving the system; that is the compatibility contract.
/// [`acceleration_with`] offers a Cholesky solve for numeric callers that want it.
pub fn acceleration<E: Evaluator>(
    eval: &E,
    ctx: Context,
    q: &Vector2<E::Scalar>,
    dq: &Vector2<E::Scalar>,
    params: &PhysicalParameters,
) -> DynamicsResult<Vector2<E::Scalar>> {
    let m = mass_matrix(eval, q, params);
    let c = coriolis_matrix(eval, q, dq, params);
    let m_inv = eval
        .invert2(&m)
        .map_err(|_| DynamicsError::SingularMassMatrix)?;

    let ddq = m_inv * -(c * dq);
    trace!(t = ctx.t, k = ctx.k, "free-motion acceleration evaluated");
    Ok(ddq)
}

/// Numeric acceleration with a selectable solve.
pub fn acceleration_with(
    ctx: Context,
    q: &Vector2<f64>,
    dq: &Vector2<f64>,
    params: &PhysicalParameters,
    mode: SolveMode,
) -> DynamicsResult<Vector2<f64>> {
    match mode {
        SolveMode::DirectInverse => acceleration(&Numeric, ctx, q, dq, params),
        SolveMode::Cholesky => {
            let m = mass_matrix(&Numeric, q, params);
            let rhs = -(coriolis_matrix(&Numeric, q, dq, params) * dq);
            let chol = m.cholesky().ok_or(DynamicsError::SingularMassMatrix)?;
            trace!(t = ctx.t, k = ctx.k, "free-motion acceleration solved by Cholesky");
            Ok(chol.solve(&rhs))
        }
    }
}

/// First-order form `(dq, ddq)` for an external integrator.
pub fn state_derivative<E: Evaluator>(
    eval: &E,
    ctx: Context,
    q: &Vector2<E::Scalar>,
    dq: &Vector2<E::Scalar>,
    params: &PhysicalParameters,
) -> DynamicsResult<(Vector2<E::Scalar>, Vector2<E::Scalar>)> {
    let ddq = acceleration(eval, ctx, q, dq, params)?;
    Ok((dq.clone(), ddq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::math::Symbolic;
    use approx::assert_relative_eq;

    fn nominal() -> PhysicalParameters {
        PhysicalParameters::nominal()
    }

    #[test]
    fn mass_matrix_at_straight_configuration() {
        let p = nominal();
        let m = mass_matrix(&Numeric, &Vector2::new(0.3, 0.0), &p);
        let (a, b, d) = (p.inertia_a(), p.coupling_b(), p.inertia_d());
        assert_relative_eq!(m[(0, 0)], a + 2.0 * b, epsilon = 1e-14);
        assert_relative_eq!(m[(0, 1)], d + b, epsilon = 1e-14);
        assert_relative_eq!(m[(1, 1)], d, epsilon = 1e-14);
    }

    #[test]
    fn mass_matrix_ignores_q0() {
        let p = nominal();
        let m1 = mass_matrix(&Numeric, &Vector2::new(0.0, 1.2), &p);
        let m2 = mass_matrix(&Numeric, &Vector2::new(-2.5, 1.2), &p);
        assert_eq!(m1, m2);
    }

    #[test]
    fn coriolis_vanishes_at_rest() {
        let c = coriolis_matrix(&Numeric, &Vector2::new(0.1, 0.9), &Vector2::zeros(), &nominal());
        assert_eq!(c, Matrix2::zeros());
    }

    #[test]
    fn acceleration_zero_when_at_rest() {
        let ddq = acceleration(&Numeric, Context::default(), &Vector2::new(0.4, 1.0), &Vector2::zeros(), &nominal()).unwrap();
        assert_relative_eq!(ddq, Vector2::zeros(), epsilon = 1e-14);
    }

    #[test]
    fn acceleration_satisfies_equation_of_motion() {
        let p = nominal();
        let q = Vector2::new(0.2, 1.1);
        let dq = Vector2::new(-0.7, 2.3);
        let ddq = acceleration(&Numeric, Context::new(0.5, 3), &q, &dq, &p).unwrap();
        let residual = mass_matrix(&Numeric, &q, &p) * ddq + coriolis_matrix(&Numeric, &q, &dq, &p) * dq;
        assert_relative_eq!(residual, Vector2::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn cholesky_matches_direct_inverse() {
        let p = nominal();
        let q = Vector2::new(0.0, 2.0);
        let dq = Vector2::new(1.5, -0.25);
        let direct = acceleration_with(Context::default(), &q, &dq, &p, SolveMode::DirectInverse).unwrap();
        let chol = acceleration_with(Context::default(), &q, &dq, &p, SolveMode::Cholesky).unwrap();
        assert_relative_eq!(direct, chol, epsilon = 1e-10);
    }

    #[test]
    fn state_derivative_passes_velocity_through() {
        let dq = Vector2::new(0.3, -0.1);
        let (v, _) = state_derivative(&Numeric, Context::default(), &Vector2::new(0.0, 1.0), &dq, &nominal()).unwrap();
        assert_eq!(v, dq);
    }

    #[test]
    fn symbolic_constants_match_numeric() {
        let p = nominal();
        let q = Vector2::new(0.2, 1.1);
        let dq = Vector2::new(-0.7, 2.3);
        let numeric = acceleration(&Numeric, Context::default(), &q, &dq, &p).unwrap();
        let symbolic = acceleration(&Symbolic, Context::default(), &q.map(Expr::from), &dq.map(Expr::from), &p).unwrap();
        for (s, n) in symbolic.iter().zip(numeric.iter()) {
            assert_relative_eq!(s.as_const().unwrap(), *n, epsilon = 1e-12);
        }
    }

    #[test]
    fn symbolic_mass_matrix_derivative() {
        // ∂M00/∂q1 = -2 b sin q1, ∂M11/∂q1 = 0
        let p = nominal();
        let q = Vector2::new(Expr::symbol("q0"), Expr::symbol("q1"));
        let m = mass_matrix(&Symbolic, &q, &p);
        let dm00 = m[(0, 0)].diff("q1").eval(&[("q1", 0.8)]).unwrap();
        assert_relative_eq!(dm00, -2.0 * p.coupling_b() * 0.8f64.sin(), epsilon = 1e-12);
        assert!(m[(1, 1)].diff("q1").as_const() == Some(0.0));
        assert!(m[(0, 0)].diff("q0").as_const() == Some(0.0));
    }
}
