use axum::{
    Json,
    extract::{Path, State},
};
use mealwise_core::domain::profile::{
    entities::{CycleInfo, PersonalityTag, Questionnaire, UserProfile, ZodiacSign},
    ports::ProfileService,
    value_objects::UpdateProfileInput,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::{
    profile::handlers::get_profile::GetProfileResponse,
    server::{
        api_entities::{api_error::ApiError, response::Response},
        app_state::AppState,
    },
};

/// Fields left out keep their stored value.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub cycle: Option<CycleInfo>,
    #[serde(default)]
    pub zodiac: Option<ZodiacSign>,
    #[serde(default)]
    pub personality: Option<Vec<PersonalityTag>>,
    #[serde(default)]
    pub questionnaire: Option<Questionnaire>,
}

#[utoipa::path(
    put,
    path = "",
    tag = "profile",
    summary = "Update the user profile",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, body = GetProfileResponse),
        (status = 400, description = "Bad request")
    )
)]
pub async fn update_profile(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Response<GetProfileResponse>, ApiError> {
    let profile: UserProfile = state
        .service
        .update_profile(UpdateProfileInput {
            user_id,
            cycle: request.cycle,
            zodiac: request.zodiac,
            personality: request.personality,
            questionnaire: request.questionnaire,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetProfileResponse { data: profile }))
}
