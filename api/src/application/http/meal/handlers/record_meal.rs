use axum::extract::{Path, State};
use mealwise_core::domain::meal::{
    entities::MealRecord, ports::MealService, value_objects::RecordMealInput,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::{
    meal::validators::RecordMealValidator,
    server::{
        api_entities::{
            api_error::{ApiError, ValidateJson},
            response::Response,
        },
        app_state::AppState,
    },
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecordMealResponse {
    pub data: MealRecord,
}

#[utoipa::path(
    post,
    path = "",
    tag = "meal",
    summary = "Record a meal manually",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    request_body = RecordMealValidator,
    responses(
        (status = 201, body = RecordMealResponse, description = "Meal recorded"),
        (status = 400, description = "Bad request")
    )
)]
pub async fn record_meal(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<RecordMealValidator>,
) -> Result<Response<RecordMealResponse>, ApiError> {
    let record = state
        .service
        .record_meal(RecordMealInput {
            user_id,
            eaten_at: payload.eaten_at,
            slot: payload.slot,
            food_name: payload.food_name,
            calories: payload.calories,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::Created(RecordMealResponse { data: record }))
}
