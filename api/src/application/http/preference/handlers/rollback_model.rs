use axum::{
    Json,
    extract::{Path, State},
};
use mealwise_core::domain::preference::ports::PreferenceService;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::{
    preference::handlers::get_current_model::PreferenceModelResponse,
    server::{
        api_entities::{api_error::ApiError, response::Response},
        app_state::AppState,
    },
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RollbackModelRequest {
    pub version: u64,
}

#[utoipa::path(
    post,
    path = "/rollback",
    tag = "preference",
    summary = "Make a retained version current again",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    request_body = RollbackModelRequest,
    responses(
        (status = 200, body = PreferenceModelResponse),
        (status = 404, description = "Version not retained")
    )
)]
pub async fn rollback_model(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<RollbackModelRequest>,
) -> Result<Response<PreferenceModelResponse>, ApiError> {
    let model = state
        .service
        .rollback_model(user_id, request.version)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(PreferenceModelResponse { data: model }))
}
