// src/ui.rs
// JSON endpoints over the dynamics core. Each request carries a state (and optionally its own
// config); the handler picks the evaluator from `symbolic`, runs the core, lowers the results to
// plain f64 arrays and answers with a `success` envelope. Failures are reported in the body.

use actix_web::{web, HttpResponse, Result};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SimConfig;
use crate::constraint::ActiveSet;
use crate::error::{DynamicsError, DynamicsResult};
use crate::impact::{apply_impact, impact_projector};
use crate::logic::{acceleration, acceleration_with, coriolis_matrix, mass_matrix, Context};
use crate::math::{Evaluator, Numeric, Symbolic};
use crate::observe::{link_geometry, observe, LinkGeometry};
use crate::params::PhysicalParameters;

#[derive(Debug, Deserialize)]
pub struct StateRequest {
    config: Option<SimConfig>, // Falls back to the server default when absent
    q: [f64; 2],               // [θ0, θ1] in radians
    dq: [f64; 2],              // [ω0, ω1]
    #[serde(default)]
    t: f64,
    #[serde(default)]
    k: usize,
}

#[derive(Debug, Deserialize)]
pub struct ImpactRequest {
    #[serde(flatten)]
    state: StateRequest,
    #[serde(default)]
    active: ActiveSet, // Active set as tracked by the caller's event detection
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(flatten)]
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct DerivativesData {
    mass: [[f64; 2]; 2],
    coriolis: [[f64; 2]; 2],
    ddq: [f64; 2],
}

#[derive(Debug, Serialize)]
struct ImpactData {
    q: [f64; 2],
    dq: [f64; 2],
    active: ActiveSet,
    impact_active: ActiveSet,
    projector: Option<[[f64; 2]; 2]>, // None when no contact was penetrated
}

#[derive(Debug, Serialize)]
struct ObserveData {
    q: [f64; 2],
    dq: [f64; 2],
    g: [f64; 2],
    geometry: LinkGeometry,
}

fn respond<T: Serialize>(what: &str, result: DynamicsResult<T>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(Envelope {
            success: true,
            error: None,
            data: Some(data),
        }),
        Err(e) => {
            warn!(error = %e, "{what} evaluation failed");
            HttpResponse::Ok().json(Envelope::<T> {
                success: false,
                error: Some(e.to_string()),
                data: None,
            })
        }
    }
}

/// Request config if given, otherwise the server default.
fn resolve(request: &StateRequest, default: &SimConfig) -> DynamicsResult<(SimConfig, PhysicalParameters)> {
    let config = request.config.unwrap_or(*default);
    let params = config.parameters()?;
    Ok((config, params))
}

fn lift<E: Evaluator>(v: [f64; 2]) -> Vector2<E::Scalar> {
    Vector2::new(E::Scalar::from(v[0]), E::Scalar::from(v[1]))
}

fn lower_scalar<E: Evaluator>(eval: &E, x: &E::Scalar) -> DynamicsResult<f64> {
    eval.to_f64(x)
        .ok_or_else(|| DynamicsError::NonNumericValue(format!("{x:?}")))
}

fn lower_vector<E: Evaluator>(eval: &E, v: &Vector2<E::Scalar>) -> DynamicsResult<[f64; 2]> {
    Ok([lower_scalar(eval, &v[0])?, lower_scalar(eval, &v[1])?])
}

fn lower_matrix<E: Evaluator>(eval: &E, m: &Matrix2<E::Scalar>) -> DynamicsResult<[[f64; 2]; 2]> {
    Ok([
        [lower_scalar(eval, &m[(0, 0)])?, lower_scalar(eval, &m[(0, 1)])?],
        [lower_scalar(eval, &m[(1, 0)])?, lower_scalar(eval, &m[(1, 1)])?],
    ])
}

fn derivatives<E: Evaluator>(
    eval: &E,
    config: &SimConfig,
    params: &PhysicalParameters,
    request: &StateRequest,
) -> DynamicsResult<DerivativesData> {
    let ctx = Context::new(request.t, request.k);
    let q = lift::<E>(request.q);
    let dq = lift::<E>(request.dq);

    let ddq = if config.symbolic {
        lower_vector(eval, &acceleration(eval, ctx, &q, &dq, params)?)?
    } else {
        // solve mode only applies to floating point
        let v = acceleration_with(ctx, &Vector2::from(request.q), &Vector2::from(request.dq), params, config.solve)?;
        [v[0], v[1]]
    };

    Ok(DerivativesData {
        mass: lower_matrix(eval, &mass_matrix(eval, &q, params))?,
        coriolis: lower_matrix(eval, &coriolis_matrix(eval, &q, &dq, params))?,
        ddq,
    })
}

fn impact<E: Evaluator>(eval: &E, params: &PhysicalParameters, request: &ImpactRequest) -> DynamicsResult<ImpactData> {
    let state = &request.state;
    let ctx = Context::new(state.t, state.k);
    let q = lift::<E>(state.q);
    let dq = lift::<E>(state.dq);

    let outcome = apply_impact(eval, ctx, &q, &dq, request.active, params)?;
    let projector = if outcome.impact_active.is_empty() {
        None
    } else {
        let delta = impact_projector(eval, &q, outcome.impact_active, params)?;
        Some(lower_matrix(eval, &delta)?)
    };

    Ok(ImpactData {
        q: lower_vector(eval, &outcome.q)?,
        dq: lower_vector(eval, &outcome.dq)?,
        active: outcome.active,
        impact_active: outcome.impact_active,
        projector,
    })
}

fn observation(params: &PhysicalParameters, request: &StateRequest) -> DynamicsResult<ObserveData> {
    let q = Vector2::from(request.q);
    let dq = Vector2::from(request.dq);
    let obs = observe(Context::new(request.t, request.k), &q, &dq, params)?;
    Ok(ObserveData {
        q: request.q,
        dq: request.dq,
        g: [obs.g[0], obs.g[1]],
        geometry: link_geometry(&q, params)?,
    })
}

pub async fn derivatives_handler(
    request: web::Json<StateRequest>,
    default: web::Data<SimConfig>,
) -> Result<HttpResponse> {
    let result = resolve(&request, &default).and_then(|(config, params)| {
        if config.symbolic {
            derivatives(&Symbolic, &config, &params, &request)
        } else {
            derivatives(&Numeric, &config, &params, &request)
        }
    });
    Ok(respond("derivative", result))
}

pub async fn impact_handler(
    request: web::Json<ImpactRequest>,
    default: web::Data<SimConfig>,
) -> Result<HttpResponse> {
    let result = resolve(&request.state, &default).and_then(|(config, params)| {
        if config.symbolic {
            impact(&Symbolic, &params, &request)
        } else {
            impact(&Numeric, &params, &request)
        }
    });
    Ok(respond("impact", result))
}

pub async fn observe_handler(
    request: web::Json<StateRequest>,
    default: web::Data<SimConfig>,
) -> Result<HttpResponse> {
    let result = resolve(&request, &default).and_then(|(_, params)| observation(&params, &request));
    Ok(respond("observation", result))
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/derivatives", web::post().to(derivatives_handler))
            .route("/impact", web::post().to(impact_handler))
            .route("/observe", web::post().to(observe_handler)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    async fn post(path: &str, body: Value) -> Value {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(SimConfig::default()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post().uri(path).set_json(body).to_request();
        test::call_and_read_body_json(&app, req).await
    }

    #[actix_web::test]
    async fn derivatives_at_rest_are_zero() {
        let body = post("/api/derivatives", json!({"q": [0.1, 1.0], "dq": [0.0, 0.0]})).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["ddq"], json!([0.0, 0.0]));
        assert_eq!(body["coriolis"][1][1], 0.0);
    }

    #[actix_web::test]
    async fn symbolic_and_numeric_agree() {
        let numeric = post("/api/derivatives", json!({"q": [0.2, 1.1], "dq": [-0.7, 2.3]})).await;
        let symbolic = post(
            "/api/derivatives",
            json!({"config": {"symbolic": true}, "q": [0.2, 1.1], "dq": [-0.7, 2.3]}),
        )
        .await;
        assert_eq!(symbolic["success"], true);
        for i in 0..2 {
            let n = numeric["ddq"][i].as_f64().unwrap();
            let s = symbolic["ddq"][i].as_f64().unwrap();
            assert!((n - s).abs() < 1e-12);
        }
    }

    #[actix_web::test]
    async fn impact_reports_both_active_sets() {
        let theta = PhysicalParameters::nominal().contact_angle().unwrap();
        let body = post(
            "/api/impact",
            json!({"q": [-1e-9, theta + 1e-9], "dq": [-1.0, 1.0], "active": [false, false]}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["active"], json!([false, false]));
        assert_eq!(body["impact_active"], json!([true, true]));
        assert!(body["projector"].is_array());
    }

    #[actix_web::test]
    async fn invalid_config_is_reported() {
        let body = post(
            "/api/observe",
            json!({"config": {"m1": 0.0}, "q": [0.0, 1.0], "dq": [0.0, 0.0]}),
        )
        .await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("m1"));
    }

    #[actix_web::test]
    async fn observe_returns_geometry() {
        let body = post("/api/observe", json!({"q": [0.0, 0.0], "dq": [1.0, 0.0], "t": 0.5, "k": 2})).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["g"][0], 0.0);
        assert!(body["geometry"]["tip"].is_array());
    }
}
