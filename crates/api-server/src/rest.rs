//! REST handlers for placements, impression beacons, clicks, and
//! operational probes.

use axum::extract::{Path, Query, State};
use axum::http::header::{REFERER, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::Json;
use adserve_core::types::{PlacementDecision, PlacementRequest};
use adserve_delivery::DeliveryEngine;
use adserve_tracking::{
    ClickOutcome, ClickRegistration, ClickTracker, ImpressionBeacon, ImpressionTracker,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::render::render_placement;

/// Maximum length for slot codes and session identifiers.
const MAX_FIELD_LEN: usize = 256;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DeliveryEngine>,
    pub impressions: Arc<ImpressionTracker>,
    pub clicks: Arc<ClickTracker>,
    pub node_id: String,
    pub start_time: Instant,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlacementQuery {
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub hide_if_empty: bool,
}

fn validate_slot_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("slot code must not be empty");
    }
    if code.len() > MAX_FIELD_LEN {
        return Err("slot code exceeds maximum length");
    }
    Ok(())
}

/// GET /v1/placements/{code} — Resolve a placement to a decision.
#[utoipa::path(
    get,
    path = "/v1/placements/{code}",
    tag = "Placements",
    params(
        ("code" = String, Path, description = "Slot placement code"),
        PlacementQuery,
    ),
    responses(
        (status = 200, description = "Placement decision", body = PlacementDecision),
        (status = 400, description = "Invalid slot code", body = ErrorResponse),
    )
)]
pub async fn handle_placement(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<PlacementQuery>,
) -> Result<Json<PlacementDecision>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(msg) = validate_slot_code(&code) {
        warn!(slot_code = %code, error = msg, "placement request validation failed");
        metrics::counter!("api.validation_errors").increment(1);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_placement_request".to_string(),
                message: msg.to_string(),
            }),
        ));
    }

    let request = PlacementRequest {
        slot_code: code,
        width: query.width,
        height: query.height,
        hide_if_empty: query.hide_if_empty,
    };
    Ok(Json(state.engine.resolve(&request).await))
}

/// GET /v1/placements/{code}/render — Placement as an embeddable HTML fragment.
#[utoipa::path(
    get,
    path = "/v1/placements/{code}/render",
    tag = "Placements",
    params(
        ("code" = String, Path, description = "Slot placement code"),
        PlacementQuery,
    ),
    responses(
        (status = 200, description = "HTML fragment (empty body when hidden)"),
    )
)]
pub async fn handle_placement_render(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<PlacementQuery>,
) -> Result<Html<String>, StatusCode> {
    if validate_slot_code(&code).is_err() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let request = PlacementRequest {
        slot_code: code,
        width: query.width,
        height: query.height,
        hide_if_empty: query.hide_if_empty,
    };
    let decision = state.engine.resolve(&request).await;
    Ok(Html(render_placement(&decision)))
}

/// POST /v1/impressions — Visibility beacon for a served creative.
#[utoipa::path(
    post,
    path = "/v1/impressions",
    tag = "Tracking",
    request_body = ImpressionBeacon,
    responses(
        (status = 200, description = "Beacon processed", body = ImpressionResponse),
        (status = 400, description = "Invalid beacon", body = ErrorResponse),
    )
)]
pub async fn handle_impression(
    State(state): State<AppState>,
    Json(beacon): Json<ImpressionBeacon>,
) -> Result<Json<ImpressionResponse>, (StatusCode, Json<ErrorResponse>)> {
    if beacon.session_id.is_empty() || beacon.session_id.len() > MAX_FIELD_LEN {
        metrics::counter!("api.validation_errors").increment(1);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_impression_beacon".to_string(),
                message: "session_id must be non-empty and within length limits".to_string(),
            }),
        ));
    }

    let recorded = state.impressions.record(&beacon).await;
    Ok(Json(ImpressionResponse { recorded }))
}

/// POST /v1/clicks — Register a click; returns the augmented redirect URL.
#[utoipa::path(
    post,
    path = "/v1/clicks",
    tag = "Tracking",
    request_body = ClickRegistration,
    responses(
        (status = 200, description = "Click processed", body = ClickResponse),
    )
)]
pub async fn handle_click(
    State(state): State<AppState>,
    Json(click): Json<ClickRegistration>,
) -> Json<ClickResponse> {
    match state.clicks.record(&click).await {
        ClickOutcome::Redirect { url } => Json(ClickResponse {
            suppressed: false,
            redirect_url: Some(url),
        }),
        ClickOutcome::Suppressed => Json(ClickResponse {
            suppressed: true,
            redirect_url: None,
        }),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClickGoQuery {
    pub slot_id: Uuid,
    pub campaign_id: Uuid,
    pub asset_id: Uuid,
    /// The campaign target URL to augment and navigate to.
    pub to: String,
}

/// GET /v1/clicks/go — Navigable click-through: redirects to the augmented
/// target, or 204 when the click is throttled. Used as the anchor href in
/// rendered fragments.
#[utoipa::path(
    get,
    path = "/v1/clicks/go",
    tag = "Tracking",
    params(ClickGoQuery),
    responses(
        (status = 307, description = "Redirect to UTM-tagged target"),
        (status = 204, description = "Click throttled, no navigation"),
    )
)]
pub async fn handle_click_go(
    State(state): State<AppState>,
    Query(query): Query<ClickGoQuery>,
    headers: HeaderMap,
) -> axum::response::Response {
    let header_str = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    let click = ClickRegistration {
        slot_id: query.slot_id,
        campaign_id: query.campaign_id,
        asset_id: query.asset_id,
        target_url: query.to,
        page_url: header_str(REFERER),
        referrer: header_str(REFERER),
        user_agent: header_str(USER_AGENT),
    };

    match state.clicks.record(&click).await {
        ClickOutcome::Redirect { url } => Redirect::temporary(&url).into_response(),
        ClickOutcome::Suppressed => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses((status = 200, description = "Ready to accept traffic"))
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize, ToSchema)]
pub struct ImpressionResponse {
    /// False when deduped, below the visibility threshold, or invalid.
    pub recorded: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ClickResponse {
    pub suppressed: bool,
    pub redirect_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
