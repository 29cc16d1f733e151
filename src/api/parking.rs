// Parking API
//
// Start a session, look it up, check occupancy and file a report.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::error::ApiError;
use crate::allocation::CapacityReport;
use crate::db::{IssueReport, ParkingSession};
use crate::portal::{ParkingAssignment, ReportForm, StartParkingForm};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CapacityResponse {
    pub summary: String,
    #[serde(flatten)]
    pub report: CapacityReport,
}

/// POST /api/parking
pub async fn start_parking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(form): Json<StartParkingForm>,
) -> Result<(StatusCode, Json<ParkingAssignment>), ApiError> {
    let assignment = state.portal.start_parking(&auth.user, &form).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// GET /api/parking
pub async fn get_parking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ParkingSession>, ApiError> {
    let session = state.portal.show_details(auth.user.id).await?;
    Ok(Json(session))
}

/// GET /api/capacity
pub async fn get_capacity(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<CapacityResponse>, ApiError> {
    let report = state.portal.check_capacity().await?;
    Ok(Json(CapacityResponse {
        summary: report.summary(),
        report,
    }))
}

/// POST /api/reports
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(form): Json<ReportForm>,
) -> Result<(StatusCode, Json<IssueReport>), ApiError> {
    let report = state.portal.report_issue(auth.user.id, &form).await?;
    Ok((StatusCode::CREATED, Json(report)))
}
