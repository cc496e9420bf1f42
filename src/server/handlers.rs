use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::error::{FallbackHint, Failure, Stage};
use crate::location::LocationQuery;
use crate::result::WeatherResult;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback: Option<FallbackHint>,
}

pub struct ApiError(StatusCode, ApiErrorBody);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

pub(super) fn status_for(failure: &Failure) -> StatusCode {
    match failure {
        Failure::InputInvalid => StatusCode::BAD_REQUEST,
        Failure::ApiKeyMissing => StatusCode::SERVICE_UNAVAILABLE,
        Failure::LocationNotFound { .. } => StatusCode::NOT_FOUND,
        Failure::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        let status = status_for(&failure);
        let (raw_query, stage) = match &failure {
            Failure::LocationNotFound { raw_query } => (Some(raw_query.clone()), None),
            Failure::UpstreamUnavailable { stage } => (None, Some(*stage)),
            _ => (None, None),
        };
        ApiError(
            status,
            ApiErrorBody {
                error: failure.user_message(),
                code: status.as_u16(),
                kind: failure.kind(),
                raw_query,
                stage,
                fallback: Some(failure.fallback_hint()),
            },
        )
    }
}

fn internal_error() -> ApiError {
    ApiError(
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiErrorBody {
            error: "Internal server error".to_string(),
            code: 500,
            kind: "internal",
            raw_query: None,
            stage: None,
            fallback: None,
        },
    )
}

// ─── GET /api/weather ────────────────────────────────────────────

/// Raw form fields; empty strings count as absent.
#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

pub async fn weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherResult>, ApiError> {
    let start = Instant::now();

    let query = LocationQuery::from_form(
        params.city.as_deref(),
        params.lat.as_deref(),
        params.lon.as_deref(),
    )?;

    // The pipeline does blocking HTTP
    let outcome = {
        let state = Arc::clone(&state);
        let query = query.clone();
        tokio::task::spawn_blocking(move || state.pipeline.resolve_weather(&query)).await
    };

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    match outcome {
        Ok(Ok(result)) => {
            info!(
                query = ?query,
                place = %result.place.display_name,
                elapsed_ms,
                "GET /api/weather"
            );
            Ok(Json(result))
        }
        Ok(Err(failure)) => {
            warn!(query = ?query, kind = failure.kind(), elapsed_ms, "GET /api/weather failed");
            Err(failure.into())
        }
        Err(e) => {
            error!(error = %e, "weather task panicked");
            Err(internal_error())
        }
    }
}
