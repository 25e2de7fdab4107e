use axum::extract::{Path, Query, State};
use chrono::{NaiveDate, Utc};
use mealwise_core::domain::{
    meal::entities::MealSlot,
    recommendation::{
        entities::Recommendation, ports::RecommendationService, value_objects::RecommendInput,
    },
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetRecommendationsQuery {
    /// Target day, today (UTC) when omitted
    pub day: Option<NaiveDate>,
    pub slot: Option<MealSlot>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetRecommendationsResponse {
    pub data: Recommendation,
}

#[utoipa::path(
    get,
    path = "/recommendations",
    tag = "recommendation",
    summary = "Ranked food recommendations",
    description = "Personalized when the user has enough history and a trained model, population defaults otherwise. With a slot, also returns ranked meal combinations sized to the slot calorie share",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        GetRecommendationsQuery,
    ),
    responses(
        (status = 200, body = GetRecommendationsResponse)
    )
)]
pub async fn get_recommendations(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<GetRecommendationsQuery>,
) -> Result<Response<GetRecommendationsResponse>, ApiError> {
    let recommendation = state
        .service
        .recommend(RecommendInput {
            user_id,
            day: query.day.unwrap_or_else(|| Utc::now().date_naive()),
            slot: query.slot,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetRecommendationsResponse {
        data: recommendation,
    }))
}
