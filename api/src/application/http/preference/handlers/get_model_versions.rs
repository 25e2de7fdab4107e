use axum::extract::{Path, State};
use mealwise_core::domain::preference::ports::PreferenceService;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetModelVersionsResponse {
    /// Retained versions, oldest first
    pub data: Vec<u64>,
}

#[utoipa::path(
    get,
    path = "/versions",
    tag = "preference",
    summary = "Retained preference model versions",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 200, body = GetModelVersionsResponse)
    )
)]
pub async fn get_model_versions(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Response<GetModelVersionsResponse>, ApiError> {
    let versions = state
        .service
        .model_versions(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetModelVersionsResponse { data: versions }))
}
