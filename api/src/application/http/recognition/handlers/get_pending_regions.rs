use axum::extract::{Path, State};
use mealwise_core::domain::{recognition::ports::RecognitionService, validation::entities::Region};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetPendingRegionsResponse {
    pub data: Vec<Region>,
}

#[utoipa::path(
    get,
    path = "/regions/pending",
    tag = "recognition",
    summary = "Regions awaiting confirmation",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 200, body = GetPendingRegionsResponse)
    )
)]
pub async fn get_pending_regions(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Response<GetPendingRegionsResponse>, ApiError> {
    let regions = state
        .service
        .pending_regions(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetPendingRegionsResponse { data: regions }))
}
