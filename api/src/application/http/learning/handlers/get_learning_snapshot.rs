use axum::extract::State;
use mealwise_core::domain::learning::{entities::LearningSnapshot, ports::LearningService};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetLearningSnapshotResponse {
    pub data: LearningSnapshot,
}

#[utoipa::path(
    get,
    path = "/snapshot",
    tag = "learning",
    summary = "Backend trust-weights and merge-rule weights",
    responses(
        (status = 200, body = GetLearningSnapshotResponse)
    )
)]
pub async fn get_learning_snapshot(
    State(state): State<AppState>,
) -> Result<Response<GetLearningSnapshotResponse>, ApiError> {
    let snapshot = state
        .service
        .learning_snapshot()
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetLearningSnapshotResponse { data: snapshot }))
}
