// src/observe.rs
// Read-only views for downstream consumers: the observation record handed to loggers and
// controllers, and the planar joint positions a renderer needs to draw the pendulum.

use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constraint::output;
use crate::error::DynamicsResult;
use crate::logic::Context;
use crate::math::DynScalar;
use crate::params::PhysicalParameters;

/// Snapshot `{q, dq, g}` where `g` is the output map at `q`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<S: nalgebra::Scalar> {
    pub q: Vector2<S>,
    pub dq: Vector2<S>,
    pub g: Vector2<S>,
}

pub fn observe<S: DynScalar>(
    ctx: Context,
    q: &Vector2<S>,
    dq: &Vector2<S>,
    params: &PhysicalParameters,
) -> DynamicsResult<Observation<S>> {
    let g = output(q, params)?;
    trace!(t = ctx.t, k = ctx.k, "observation assembled");
    Ok(Observation {
        q: q.clone(),
        dq: dq.clone(),
        g,
    })
}

/// Cartesian positions of the pivot, the elbow, the tip of link 1 and the contact point
/// (half-way along link 1 when it sits at the contact angle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkGeometry {
    pub origin: Point2<f64>,
    pub elbow: Point2<f64>,
    pub tip: Point2<f64>,
    pub contact: Point2<f64>,
}

pub fn link_geometry(q: &Vector2<f64>, params: &PhysicalParameters) -> DynamicsResult<LinkGeometry> {
    let theta_c = params.contact_angle()?;
    let rot = Rotation2::new(q[0]);

    let origin = Point2::origin();
    let elbow = origin + params.l0() * Vector2::new(q[0].cos(), q[0].sin());
    let tip = elbow + rot * (params.l1() * Vector2::new(q[1].cos(), q[1].sin()));
    let contact = elbow + rot * (params.l1() / 2.0 * Vector2::new(theta_c.cos(), theta_c.sin()));

    Ok(LinkGeometry {
        origin,
        elbow,
        tip,
        contact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn observation_carries_constraint_output() {
        let p = PhysicalParameters::nominal();
        let q = Vector2::new(0.25, 0.5);
        let dq = Vector2::new(1.0, -1.0);
        let obs = observe(Context::new(1.0, 7), &q, &dq, &p).unwrap();
        assert_eq!(obs.q, q);
        assert_eq!(obs.dq, dq);
        assert_relative_eq!(obs.g[0], 0.25);
        assert_relative_eq!(obs.g[1], -0.5 + p.contact_angle().unwrap(), epsilon = 1e-14);
    }

    #[test]
    fn straight_chain_along_x() {
        let p = PhysicalParameters::nominal();
        let geo = link_geometry(&Vector2::zeros(), &p).unwrap();
        assert_eq!(geo.origin, Point2::origin());
        assert_relative_eq!(geo.elbow, Point2::new(p.l0(), 0.0), epsilon = 1e-14);
        assert_relative_eq!(geo.tip, Point2::new(p.l0() + p.l1(), 0.0), epsilon = 1e-14);
    }

    #[test]
    fn rotation_composes_with_link_0() {
        let p = PhysicalParameters::nominal();
        let q = Vector2::new(std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2);
        let geo = link_geometry(&q, &p).unwrap();
        // link 0 points up, link 1 is folded a further quarter turn to point left
        assert_relative_eq!(geo.elbow, Point2::new(0.0, p.l0()), epsilon = 1e-12);
        assert_relative_eq!(geo.tip, Point2::new(-p.l1(), p.l0()), epsilon = 1e-12);
    }

    #[test]
    fn contact_point_lies_on_link_at_contact_angle() {
        let p = PhysicalParameters::nominal();
        let theta_c = p.contact_angle().unwrap();
        let geo = link_geometry(&Vector2::new(0.3, theta_c), &p).unwrap();
        let midpoint = geo.elbow + (geo.tip - geo.elbow) / 2.0;
        assert_relative_eq!(geo.contact, midpoint, epsilon = 1e-12);
    }
}
