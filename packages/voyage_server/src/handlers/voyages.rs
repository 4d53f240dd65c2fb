use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use voyage_hub::RoleStatus;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct VoyageSummary {
    pub voyage_id: String,
    /// Number of live connections in the voyage
    pub members: usize,
    pub roles: RoleStatus,
}

/// Occupancy of every limited role; unknown voyages report all vacant.
pub async fn get_role_status(
    State(state): State<AppState>,
    Path(voyage_id): Path<String>,
) -> impl IntoResponse {
    Json(state.hub.role_status(&voyage_id).await)
}

pub async fn get_voyage(
    State(state): State<AppState>,
    Path(voyage_id): Path<String>,
) -> impl IntoResponse {
    let members = state.hub.member_count(&voyage_id).await;
    let roles = state.hub.role_status(&voyage_id).await;
    Json(VoyageSummary {
        voyage_id,
        members,
        roles,
    })
}
