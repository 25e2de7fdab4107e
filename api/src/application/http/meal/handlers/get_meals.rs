use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use mealwise_core::domain::meal::{entities::MealRecord, ports::MealService};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetMealsQuery {
    /// Only records eaten on this day (UTC)
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetMealsResponse {
    pub data: Vec<MealRecord>,
    pub count: usize,
}

#[utoipa::path(
    get,
    path = "",
    tag = "meal",
    summary = "Meal history",
    description = "All meal records of the user, oldest first",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        GetMealsQuery,
    ),
    responses(
        (status = 200, body = GetMealsResponse)
    )
)]
pub async fn get_meals(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<GetMealsQuery>,
) -> Result<Response<GetMealsResponse>, ApiError> {
    let mut records = state
        .service
        .list_meals(user_id)
        .await
        .map_err(ApiError::from)?;

    if let Some(day) = query.day {
        records.retain(|r| r.day() == day);
    }

    Ok(Response::OK(GetMealsResponse {
        count: records.len(),
        data: records,
    }))
}
