use axum::extract::{Path, State};
use mealwise_core::domain::profile::{entities::UserProfile, ports::ProfileService};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetProfileResponse {
    pub data: UserProfile,
}

#[utoipa::path(
    get,
    path = "",
    tag = "profile",
    summary = "User profile",
    description = "Stored profile, or an empty one when the user never set it",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 200, body = GetProfileResponse)
    )
)]
pub async fn get_profile(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Response<GetProfileResponse>, ApiError> {
    let profile = state
        .service
        .get_profile(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetProfileResponse { data: profile }))
}
