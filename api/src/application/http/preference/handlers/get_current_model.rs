use axum::extract::{Path, State};
use mealwise_core::domain::preference::{entities::PreferenceModel, ports::PreferenceService};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PreferenceModelResponse {
    pub data: PreferenceModel,
}

#[utoipa::path(
    get,
    path = "",
    tag = "preference",
    summary = "Current preference model",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 200, body = PreferenceModelResponse),
        (status = 404, description = "No model trained yet")
    )
)]
pub async fn get_current_model(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Response<PreferenceModelResponse>, ApiError> {
    let model = state
        .service
        .current_model(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(PreferenceModelResponse { data: model }))
}
