//! HTTP handlers and middleware for the REST API.

use std::time::Instant;

use axum::{
    Json,
    extract::{MatchedPath, Query, Request, State, rejection::{JsonRejection, QueryRejection}},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use super::dto::{
    CreateLectureRequest, CreateVenueRequest, HealthResponse, LectureCreatedResponse, LectureDto,
    LectureQuery, VenueCreatedResponse, VerifyTokenRequest, VerifyTokenResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::auth::AuthError;
use crate::engine::EngineError;
use crate::model::{LectureFilter, Venue};
use crate::observability;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// GET /
pub async fn root() -> &'static str {
    "lectern scheduling server is running"
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let venues = state.store.venue_names().await?.len();
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        venues,
    }))
}

// ── Venues ───────────────────────────────────────────────────────

/// GET /venues
pub async fn list_venues(State(state): State<AppState>) -> HandlerResult<Vec<Venue>> {
    Ok(Json(state.store.list_venues().await?))
}

/// GET /api/venues
///
/// Venue names only, alphabetically. Feeds the venue picker in the lecturer UI.
pub async fn venue_names(State(state): State<AppState>) -> HandlerResult<Vec<String>> {
    Ok(Json(state.store.venue_names().await?))
}

/// POST /venues
pub async fn create_venue(
    State(state): State<AppState>,
    payload: Result<Json<CreateVenueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VenueCreatedResponse>), AppError> {
    let Json(request) = payload?;
    let (name, capacity) = request.into_parts()?;
    let venue = state.store.create_venue(&name, capacity).await?;
    info!("venue added: {} ({} seats)", venue.name, venue.capacity);
    metrics::counter!(observability::VENUES_CREATED_TOTAL).increment(1);
    Ok((
        StatusCode::CREATED,
        Json(VenueCreatedResponse {
            message: "Venue added".to_string(),
            venue,
        }),
    ))
}

// ── Lectures ─────────────────────────────────────────────────────

/// GET /lectures?department=&level=
pub async fn list_lectures(
    State(state): State<AppState>,
    query: Result<Query<LectureQuery>, QueryRejection>,
) -> HandlerResult<Vec<LectureDto>> {
    let Query(query) = query?;
    let filter = LectureFilter::from(query);
    let lectures = state.store.list_lectures(&filter).await?;
    Ok(Json(lectures.into_iter().map(LectureDto::from).collect()))
}

/// POST /api/lecturer/lectures
///
/// Requires a lecturer bearer token (see [`require_lecturer`]).
pub async fn schedule_lecture(
    State(state): State<AppState>,
    payload: Result<Json<CreateLectureRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LectureCreatedResponse>), AppError> {
    let Json(request) = payload?;
    let new_lecture = request.into_new_lecture()?;

    match state.store.schedule_lecture(new_lecture).await {
        Ok(lecture) => {
            info!(
                "lecture scheduled: {} in {} on {} {}-{}",
                lecture.course,
                lecture.slot.venue,
                lecture.slot.date,
                lecture.slot.span.start,
                lecture.slot.span.end
            );
            metrics::counter!(observability::LECTURES_SCHEDULED_TOTAL).increment(1);
            Ok((
                StatusCode::CREATED,
                Json(LectureCreatedResponse {
                    message: "Lecture scheduled".to_string(),
                    lecture: lecture.into(),
                }),
            ))
        }
        Err(e @ EngineError::Conflict { .. }) => {
            metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

// ── Lecturer token ───────────────────────────────────────────────

/// POST /api/lecturer/verify
///
/// Lets the UI check a token before unlocking the scheduling form.
pub async fn verify_token(
    State(state): State<AppState>,
    payload: Result<Json<VerifyTokenRequest>, JsonRejection>,
) -> Response {
    let token = payload
        .ok()
        .and_then(|Json(req)| req.token)
        .filter(|t| !t.is_empty());
    let Some(token) = token else {
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyTokenResponse {
                valid: false,
                error: Some("Token required".to_string()),
            }),
        )
            .into_response();
    };
    Json(VerifyTokenResponse {
        valid: state.authorizer.verify(&token),
        error: None,
    })
    .into_response()
}

// ── Middleware ───────────────────────────────────────────────────

/// Reject requests that don't carry a valid lecturer token.
pub async fn require_lecturer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // A header that isn't valid UTF-8 counts as present but wrong.
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|h| h.to_str().unwrap_or_default());

    if let Err(e) = state.authorizer.authorize(header) {
        let reason = match e {
            AuthError::MissingCredentials => "missing",
            AuthError::InvalidToken => "invalid",
        };
        warn!("lecturer auth failed for {}: {e}", request.uri().path());
        metrics::counter!(observability::AUTH_FAILURES_TOTAL, "reason" => reason).increment(1);
        return Err(e.into());
    }
    Ok(next.run(request).await)
}

/// Record request count and latency per matched route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = observability::status_label(response.status().as_u16());
    metrics::counter!(
        observability::HTTP_REQUESTS_TOTAL,
        "route" => route.clone(),
        "method" => method.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        observability::HTTP_REQUEST_DURATION_SECONDS,
        "route" => route,
        "method" => method
    )
    .record(start.elapsed().as_secs_f64());
    response
}
