use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use quote_intake::intake::{intake_router, IntakeService, WizardStore, FIELD_SCHEMA};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_intake_routes<S>(service: Arc<IntakeService<S>>) -> Router
where
    S: WizardStore + 'static,
{
    intake_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/intake/schema", get(schema_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Field rules per step so the hosting page can mirror messages client-side.
pub(crate) async fn schema_endpoint() -> Json<serde_json::Value> {
    let fields: Vec<_> = FIELD_SCHEMA
        .iter()
        .filter(|spec| spec.rule.is_visible())
        .map(|spec| {
            json!({
                "field": spec.name,
                "step": spec.step.number(),
                "message": spec.message,
            })
        })
        .collect();
    Json(json!({ "fields": fields }))
}
