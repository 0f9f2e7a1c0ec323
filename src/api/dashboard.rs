//! Dashboard API endpoints
//!
//! Handles HTTP requests for the dashboard views:
//! - GET /api/dashboard/summary    - KPI summary over the caller's entries
//! - GET /api/dashboard/chart-data - Daily trend over the trailing 30 days
//!
//! Both endpoints aggregate the caller's scoped entries: regular users see
//! their own totals, admins see fleet-wide totals.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::aggregate::{
    compute_daily_trend, compute_summary, DailyBucket, DashboardSummary, TREND_WINDOW_DAYS,
};

/// Response for the chart data endpoint
#[derive(Debug, Serialize)]
pub struct ChartDataResponse {
    pub daily_trend: Vec<DailyBucket>,
}

/// Build the dashboard router (mounted behind the auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/chart-data", get(get_chart_data))
}

/// GET /api/dashboard/summary - KPI summary
async fn get_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<DashboardSummary>, ApiError> {
    let entries = state.entry_service.list_for(&user.0).await?;
    Ok(Json(compute_summary(&entries, Utc::now())))
}

/// GET /api/dashboard/chart-data - Daily trend for chart rendering
///
/// Dates without entries are omitted; a chart wanting a continuous axis
/// interpolates the gaps itself.
async fn get_chart_data(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ChartDataResponse>, ApiError> {
    let entries = state.entry_service.list_for(&user.0).await?;
    let daily_trend = compute_daily_trend(&entries, TREND_WINDOW_DAYS, Utc::now());
    Ok(Json(ChartDataResponse { daily_trend }))
}
