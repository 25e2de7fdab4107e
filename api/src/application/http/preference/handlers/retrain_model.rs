use axum::extract::{Path, State};
use mealwise_core::domain::preference::ports::PreferenceService;
use uuid::Uuid;

use crate::application::http::{
    preference::handlers::get_current_model::PreferenceModelResponse,
    server::{
        api_entities::{api_error::ApiError, response::Response},
        app_state::AppState,
    },
};

#[utoipa::path(
    post,
    path = "/retrain",
    tag = "preference",
    summary = "Rebuild the model from the full history",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 201, body = PreferenceModelResponse),
        (status = 422, description = "Not enough data to train")
    )
)]
pub async fn retrain_model(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Response<PreferenceModelResponse>, ApiError> {
    let model = state
        .service
        .retrain(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::Created(PreferenceModelResponse { data: model }))
}
