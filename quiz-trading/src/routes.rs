//! HTTP routes for the quiz service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backtest::StrategyParams;
use crate::data::{AssetType, Timeframe};
use crate::QuizState;

// ============================================================================
// Error Response
// ============================================================================

/// Error wrapper rendering `{ "success": false, "error": ... }`.
#[derive(Debug)]
pub struct ApiError(pub quiz_common::Error);

impl<E: Into<quiz_common::Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct QuizQuery {
    pub timeframe: Option<String>,
    pub session: Option<String>,
}

/// Strategy submission body
#[derive(Debug, Deserialize)]
pub struct StrategyRequest {
    pub take_profit_price: f64,
    pub stop_loss_price: f64,
    #[serde(default = "default_max_holding")]
    pub max_holding_periods: usize,
}

fn default_max_holding() -> usize {
    crate::quiz::DEFAULT_HORIZON_PERIODS
}

#[derive(Debug, Deserialize)]
pub struct SaveEntryRequest {
    pub session_id: String,
    pub id: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "quiz-trading".to_string(),
    })
}

/// Generate a quiz for a stock or crypto symbol
pub async fn start_quiz(
    State(state): State<Arc<QuizState>>,
    Path((asset, symbol)): Path<(String, String)>,
    Query(query): Query<QuizQuery>,
) -> ApiResult<ApiResponse<crate::service::QuizStart>> {
    let asset_type = AssetType::from_str(&asset).ok_or_else(|| {
        quiz_common::Error::NotFound(format!("Unknown asset type: {}", asset))
    })?;

    let timeframe = match query.timeframe.as_deref() {
        Some(raw) => Some(Timeframe::from_str(raw).ok_or_else(|| {
            quiz_common::Error::InvalidInput(format!("Unknown timeframe: {}", raw))
        })?),
        None => None,
    };

    let quiz = state
        .service
        .start_quiz(asset_type, &symbol, timeframe, query.session)
        .await?;

    Ok(ApiResponse::ok(quiz))
}

/// Backtest a strategy against a pending quiz
pub async fn submit_strategy(
    State(state): State<Arc<QuizState>>,
    Path(quiz_id): Path<String>,
    Json(request): Json<StrategyRequest>,
) -> ApiResult<ApiResponse<crate::service::StrategyResult>> {
    let params = StrategyParams::new(
        request.take_profit_price,
        request.stop_loss_price,
        request.max_holding_periods,
    );

    let result = state.service.submit_strategy(&quiz_id, params).await?;
    Ok(ApiResponse::ok(result))
}

/// Get cumulative stats for a session
pub async fn get_session_stats(
    State(state): State<Arc<QuizState>>,
    Path(session_id): Path<String>,
) -> Json<ApiResponse<crate::service::SessionView>> {
    ApiResponse::ok(state.service.session_stats(&session_id).await)
}

/// Reset a session's stats
pub async fn reset_session_stats(
    State(state): State<Arc<QuizState>>,
    Path(session_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    if state.service.reset_session(&session_id).await {
        Ok(Json(serde_json::json!({
            "success": true,
            "message": format!("Session {} reset", session_id)
        })))
    } else {
        Err(quiz_common::Error::NotFound(format!("Session {}", session_id)).into())
    }
}

/// List leaderboard entries, best total P/L first
pub async fn get_leaderboard(
    State(state): State<Arc<QuizState>>,
) -> ApiResult<ApiResponse<crate::leaderboard::LeaderboardSummary>> {
    Ok(ApiResponse::ok(state.service.leaderboard()?))
}

/// Save a session snapshot to the leaderboard
pub async fn save_leaderboard_entry(
    State(state): State<Arc<QuizState>>,
    Json(request): Json<SaveEntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<crate::leaderboard::LeaderboardEntry>>), ApiError> {
    let entry = state
        .service
        .save_to_leaderboard(&request.session_id, &request.id, request.overwrite)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(entry)))
}

/// Delete one leaderboard entry
pub async fn delete_leaderboard_entry(
    State(state): State<Arc<QuizState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<DeletedResponse>> {
    state.service.delete_entry(&id)?;
    Ok(ApiResponse::ok(DeletedResponse { deleted: 1 }))
}

/// Delete every leaderboard entry
pub async fn clear_leaderboard(
    State(state): State<Arc<QuizState>>,
) -> ApiResult<ApiResponse<DeletedResponse>> {
    let deleted = state.service.clear_leaderboard()?;
    Ok(ApiResponse::ok(DeletedResponse { deleted }))
}
