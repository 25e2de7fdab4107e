use axum::extract::{Path, Query, State};
use mealwise_core::domain::{
    preference::entities::SimilarFood,
    recommendation::{ports::RecommendationService, value_objects::SimilarFoodsInput},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetSimilarFoodsQuery {
    pub food_name: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetSimilarFoodsResponse {
    pub data: Vec<SimilarFood>,
}

#[utoipa::path(
    get,
    path = "/similar-foods",
    tag = "recommendation",
    summary = "Foods similar to a given one",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        GetSimilarFoodsQuery,
    ),
    responses(
        (status = 200, body = GetSimilarFoodsResponse),
        (status = 400, description = "Missing food name")
    )
)]
pub async fn get_similar_foods(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<GetSimilarFoodsQuery>,
) -> Result<Response<GetSimilarFoodsResponse>, ApiError> {
    if query.food_name.trim().is_empty() {
        return Err(ApiError::BadRequest("food_name is required".to_string()));
    }

    let similar = state
        .service
        .similar_foods(SimilarFoodsInput {
            user_id,
            food_name: query.food_name,
            limit: query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetSimilarFoodsResponse { data: similar }))
}
