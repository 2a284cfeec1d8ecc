// src/params.rs
// Physical parameters of the two-link pendulum and the constants derived from them.
// Link 0 is a compound body (point mass at its tip plus distributed rod inertia); link 1 hangs
// from the tip of link 0 and may not swing past the contact angle arccos(-d/b).
// A PhysicalParameters value is validated once at construction and read-only afterwards.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, DynamicsResult};

/// Validated physical parameters: masses, link lengths and restitution coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameters")]
pub struct PhysicalParameters {
    m0: f64,
    m1: f64,
    l0: f64,
    l1: f64,
    gamma: f64,
}

/// Unvalidated mirror of [`PhysicalParameters`], used as the serde entry point.
#[derive(Deserialize)]
struct RawParameters {
    m0: f64,
    m1: f64,
    l0: f64,
    l1: f64,
    gamma: f64,
}

impl TryFrom<RawParameters> for PhysicalParameters {
    type Error = DynamicsError;

    fn try_from(raw: RawParameters) -> DynamicsResult<Self> {
        Self::new(raw.m0, raw.m1, raw.l0, raw.l1, raw.gamma)
    }
}

impl PhysicalParameters {
    /// Builds a parameter set, rejecting non-positive masses/lengths and unrealizable contact geometry.
    pub fn new(m0: f64, m1: f64, l0: f64, l1: f64, gamma: f64) -> DynamicsResult<Self> {
        for (name, value) in [("m0", m0), ("m1", m1), ("l0", l0), ("l1", l1)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DynamicsError::InvalidPhysicalParameters(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        if !gamma.is_finite() {
            return Err(DynamicsError::InvalidPhysicalParameters(format!(
                "gamma must be finite, got {gamma}"
            )));
        }

        let params = Self { m0, m1, l0, l1, gamma };
        params.contact_angle()?; // fail fast on |d/b| > 1
        Ok(params)
    }

    /// `{m0=1, m1=1, l0=0.5, l1=2/7, gamma=0.3}`.
    pub fn nominal() -> Self {
        Self {
            m0: 1.0,
            m1: 1.0,
            l0: 0.5,
            l1: 2.0 / 7.0,
            gamma: 0.3,
        }
    }

    /// Same masses and lengths with a different restitution coefficient.
    pub fn with_gamma(self, gamma: f64) -> DynamicsResult<Self> {
        Self::new(self.m0, self.m1, self.l0, self.l1, gamma)
    }

    pub fn m0(&self) -> f64 {
        self.m0
    }

    pub fn m1(&self) -> f64 {
        self.m1
    }

    pub fn l0(&self) -> f64 {
        self.l0
    }

    pub fn l1(&self) -> f64 {
        self.l1
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Constant part of `M[0][0]`:
    /// `m0*l0²/3 + m1*l1²/3 + m0*(l0/2)² + m1*(l0² + (l1/2)²)`.
    pub fn inertia_a(&self) -> f64 {
        let (m0, m1, l0, l1) = (self.m0, self.m1, self.l0, self.l1);
        m0 * l0.powi(2) / 3.0
            + m1 * l1.powi(2) / 3.0
            + m0 * (l0 / 2.0).powi(2)
            + m1 * (l0.powi(2) + (l1 / 2.0).powi(2))
    }

    /// Coupling coefficient `b = m1*l0*l1/2`, multiplying cos(q1) and sin(q1).
    pub fn coupling_b(&self) -> f64 {
        self.m1 * self.l0 * self.l1 / 2.0
    }

    /// Link-1 inertia about the joint, `d = m1*l1²/3 + m1*(l1/2)²`.
    pub fn inertia_d(&self) -> f64 {
        self.m1 * self.l1.powi(2) / 3.0 + self.m1 * (self.l1 / 2.0).powi(2)
    }

    /// Contact angle `arccos(-d/b)` of link 1 relative to link 0.
    pub fn contact_angle(&self) -> DynamicsResult<f64> {
        let ratio = self.inertia_d() / self.coupling_b();
        if !ratio.is_finite() || ratio.abs() > 1.0 {
            return Err(DynamicsError::InvalidContactGeometry { ratio: ratio.abs() });
        }
        Ok((-ratio).acos())
    }
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        Self::nominal()
    }
}

/// Configuration at which both constraints are zero: `[0, arccos(-d/b)]`.
pub fn simultaneous_impact_configuration(params: &PhysicalParameters) -> DynamicsResult<Vector2<f64>> {
    Ok(Vector2::new(0.0, params.contact_angle()?))
}

/// Velocity approaching both contacts at once.
pub fn simultaneous_impact_velocity() -> Vector2<f64> {
    Vector2::new(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nominal_contact_angle() {
        let p = PhysicalParameters::nominal();
        // d/b = (1/21) / (1/14) = 2/3
        assert_relative_eq!(p.inertia_d() / p.coupling_b(), 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(p.contact_angle().unwrap(), (-2.0f64 / 3.0).acos(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_zero_mass() {
        let err = PhysicalParameters::new(1.0, 0.0, 0.5, 2.0 / 7.0, 0.3).unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidPhysicalParameters(_)));
    }

    #[test]
    fn rejects_negative_length() {
        let err = PhysicalParameters::new(1.0, 1.0, -0.5, 2.0 / 7.0, 0.3).unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidPhysicalParameters(_)));
    }

    #[test]
    fn rejects_unrealizable_geometry() {
        // long link 1 on a short link 0: d/b = 7 l1 / (6 l0) > 1
        let err = PhysicalParameters::new(1.0, 1.0, 0.1, 1.0, 0.3).unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidContactGeometry { ratio } if ratio > 1.0));
    }

    #[test]
    fn deserialization_validates() {
        let ok: PhysicalParameters =
            serde_json::from_str(r#"{"m0":1,"m1":1,"l0":0.5,"l1":0.2857142857142857,"gamma":0.3}"#).unwrap();
        assert_relative_eq!(ok.l1(), 2.0 / 7.0, epsilon = 1e-12);

        let bad = serde_json::from_str::<PhysicalParameters>(r#"{"m0":1,"m1":0,"l0":0.5,"l1":0.3,"gamma":0.3}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn simultaneous_configuration_uses_contact_angle() {
        let p = PhysicalParameters::nominal();
        let q = simultaneous_impact_configuration(&p).unwrap();
        assert_eq!(q[0], 0.0);
        assert_eq!(q[1], p.contact_angle().unwrap());
        assert_eq!(simultaneous_impact_velocity(), Vector2::new(-1.0, 1.0));
    }
}
