//! REST endpoints for the survey funnel.
//!
//! The server side of the funnel: session CRUD, completion (promo
//! issuance + webhook), results enrichment, and the analytics intake.
//! CORS is permissive because the funnel is embedded in third-party
//! landing pages.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::answers::SurveyAnswers;
use crate::catalog::archetype_by_id;
use crate::classifier::{classify, personalized_cta};
use crate::enrich::EnrichmentPipeline;
use crate::error::{EnrichError, Error};
use crate::promo::PromoIssuer;
use crate::store::SessionStore;
use crate::webhook::CompletionWebhook;

/// Shared state for the survey routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub enrichment: Arc<EnrichmentPipeline>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub promo: PromoIssuer,
    pub webhook: Option<Arc<CompletionWebhook>>,
}

struct ApiError(Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Error::Flow(_) => StatusCode::BAD_REQUEST,
            Error::Enrich(EnrichError::NotCompleted) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// ── Request bodies ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    #[serde(default)]
    referrer_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAnswersRequest {
    answers: SurveyAnswers,
    current_step: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserInfoRequest {
    name: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest {
    session_id: String,
    #[serde(default)]
    is_retake: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResultsRequest {
    session_id: String,
}

#[derive(Deserialize)]
struct AnalyticsRequest {
    events: Vec<AnalyticsEvent>,
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/session — start a new session.
async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .store
        .create_session(body.referrer_id.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/session/{id} — fetch a session for restore.
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.store.get_session(&id).await?;
    Ok(Json(session))
}

/// PUT /api/session/{id}/answers — replace answers and step.
async fn update_answers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAnswersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .store
        .update_answers(&id, &body.answers, body.current_step)
        .await?;
    Ok(Json(session))
}

/// PATCH /api/session/{id}/user — record the respondent's name/email.
async fn update_user_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserInfoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .store
        .update_user_info(&id, &body.name, body.email.as_deref())
        .await?;
    Ok(Json(session))
}

/// POST /api/complete — classify, issue the promo code, notify.
///
/// Idempotent: completing an already-completed session returns the
/// original archetype and promo code without issuing a new one.
async fn complete(
    State(state): State<AppState>,
    Json(body): Json<CompleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.store.get_session(&body.session_id).await?;

    if session.is_completed {
        let archetype = session
            .archetype_result
            .as_deref()
            .and_then(archetype_by_id)
            .unwrap_or_else(|| classify(&session.answers));
        return Ok(Json(serde_json::json!({
            "sessionId": session.session_id,
            "archetype": archetype,
            "promoCode": session.promo_code,
            "cta": personalized_cta(archetype.id, &session.answers),
            "alreadyCompleted": true,
        })));
    }

    let archetype = classify(&session.answers);
    let cta = personalized_cta(archetype.id, &session.answers);
    let promo = state.promo.issue(&session.session_id, body.is_retake);
    let archetype_data =
        serde_json::to_value(archetype).unwrap_or_else(|_| serde_json::json!({}));

    let completed = state
        .store
        .complete_session(&session.session_id, archetype.id, &archetype_data, &promo.code)
        .await?;
    state
        .store
        .insert_promo(&promo, completed.referrer_id.as_deref())
        .await?;

    if let Some(webhook) = &state.webhook {
        webhook.notify(&completed, &promo);
    }

    info!(session_id = %completed.session_id, archetype = archetype.id, "Session completed");
    Ok(Json(serde_json::json!({
        "sessionId": completed.session_id,
        "archetype": archetype,
        "promoCode": promo.code,
        "points": promo.points,
        "cta": cta,
        "alreadyCompleted": false,
    })))
}

/// POST /api/generate-results — enrich a completed session.
async fn generate_results(
    State(state): State<AppState>,
    Json(body): Json<GenerateResultsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.enrichment.enrich(&body.session_id).await?;
    Ok(Json(session))
}

/// POST /api/analytics — ingest a batch of funnel events.
///
/// Always accepts; ingestion failures are the sink's problem.
async fn ingest_analytics(
    State(state): State<AppState>,
    Json(body): Json<AnalyticsRequest>,
) -> impl IntoResponse {
    let received = body.events.len();
    state.analytics.ingest(body.events).await;
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "received": received })),
    )
}

/// Build the survey REST routes.
pub fn survey_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/session/{id}", get(get_session))
        .route("/api/session/{id}/answers", axum::routing::put(update_answers))
        .route("/api/session/{id}/user", axum::routing::patch(update_user_info))
        .route("/api/complete", post(complete))
        .route("/api/generate-results", post(generate_results))
        .route("/api/analytics", post(ingest_analytics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
