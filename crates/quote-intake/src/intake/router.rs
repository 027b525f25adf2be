use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::attachments::AttachmentCandidate;
use super::domain::{FieldInput, WizardId, FAILURE_MESSAGE};
use super::repository::{StoreError, WizardStore};
use super::schema::FieldName;
use super::service::{IntakeService, IntakeServiceError};
use super::wizard::WizardError;

#[derive(Debug, Default, Deserialize)]
pub struct OpenWizardQuery {
    pub work_type: Option<String>,
}

/// Router exposing the wizard to the hosting page.
pub fn intake_router<S>(service: Arc<IntakeService<S>>) -> Router
where
    S: WizardStore + 'static,
{
    Router::new()
        .route("/api/v1/intake/wizards", post(open_handler::<S>))
        .route(
            "/api/v1/intake/wizards/:wizard_id",
            get(view_handler::<S>).delete(close_handler::<S>),
        )
        .route(
            "/api/v1/intake/wizards/:wizard_id/fields",
            patch(edit_handler::<S>),
        )
        .route(
            "/api/v1/intake/wizards/:wizard_id/advance",
            post(advance_handler::<S>),
        )
        .route(
            "/api/v1/intake/wizards/:wizard_id/retreat",
            post(retreat_handler::<S>),
        )
        .route(
            "/api/v1/intake/wizards/:wizard_id/attachments",
            post(attach_handler::<S>),
        )
        .route(
            "/api/v1/intake/wizards/:wizard_id/attachments/:index",
            delete(detach_handler::<S>),
        )
        .route(
            "/api/v1/intake/wizards/:wizard_id/submit",
            post(submit_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn open_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Query(query): Query<OpenWizardQuery>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.open(query.work_type.as_deref()) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn view_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.view(&WizardId(wizard_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn edit_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(wizard_id): Path<String>,
    Json(edits): Json<BTreeMap<FieldName, FieldInput>>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.edit(&WizardId(wizard_id), edits) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.advance(&WizardId(wizard_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn retreat_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.retreat(&WizardId(wizard_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn attach_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(wizard_id): Path<String>,
    Json(candidates): Json<Vec<AttachmentCandidate>>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.attach(&WizardId(wizard_id), candidates) {
        Ok((intake, view)) => {
            let payload = json!({ "intake": intake, "wizard": view });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detach_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path((wizard_id, index)): Path<(String, usize)>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.detach(&WizardId(wizard_id), index) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.submit(&WizardId(wizard_id)).await {
        Ok(result) if result.spam_detected => StatusCode::NO_CONTENT.into_response(),
        Ok(result) if result.success => (StatusCode::OK, Json(result)).into_response(),
        Ok(result) => (StatusCode::BAD_GATEWAY, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn close_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    S: WizardStore + 'static,
{
    match service.close(&WizardId(wizard_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: IntakeServiceError) -> Response {
    match err {
        IntakeServiceError::Wizard(WizardError::Validation(report)) => {
            let payload = json!({
                "error": "validation failed",
                "step": report.step,
                "errors": report.errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        IntakeServiceError::Wizard(err @ WizardError::InvalidFieldValue { .. }) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        IntakeServiceError::Wizard(err @ WizardError::AttachmentIndex(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        IntakeServiceError::Wizard(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        IntakeServiceError::Store(StoreError::NotFound) => {
            let payload = json!({ "error": "wizard not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        IntakeServiceError::Store(StoreError::Conflict) => {
            let payload = json!({ "error": "wizard already exists" });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        IntakeServiceError::Store(StoreError::Unavailable(_)) => {
            let payload = json!({ "error": FAILURE_MESSAGE });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}
