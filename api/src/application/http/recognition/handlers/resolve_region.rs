use axum::{
    Json,
    extract::{Path, State},
};
use mealwise_core::domain::{
    recognition::{
        ports::RecognitionService,
        value_objects::{RegionResolution, ResolveRegionInput},
    },
    validation::entities::UserChoice,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolveRegionRequest {
    /// Omit (or null) to reject the region.
    #[serde(default)]
    pub choice: Option<UserChoice>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ResolveRegionResponse {
    pub data: RegionResolution,
}

#[utoipa::path(
    post,
    path = "/regions/{region_id}/resolve",
    tag = "recognition",
    summary = "Resolve a region awaiting confirmation",
    description = "Confirms a suggestion, accepts an edited value, or rejects the region when no choice is given.",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("region_id" = Uuid, Path, description = "Region id"),
    ),
    request_body = ResolveRegionRequest,
    responses(
        (status = 200, body = ResolveRegionResponse),
        (status = 400, description = "Invalid choice"),
        (status = 404, description = "Unknown region"),
        (status = 409, description = "Region already resolved")
    )
)]
pub async fn resolve_region(
    Path((user_id, region_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
    Json(request): Json<ResolveRegionRequest>,
) -> Result<Response<ResolveRegionResponse>, ApiError> {
    let owned = state
        .service
        .regions
        .get(region_id)
        .await
        .is_some_and(|region| region.user_id == user_id);
    if !owned {
        return Err(ApiError::NotFound(format!("Region '{}' not found", region_id)));
    }

    let resolution = state
        .service
        .resolve_region(ResolveRegionInput {
            region_id,
            choice: request.choice,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(ResolveRegionResponse { data: resolution }))
}
