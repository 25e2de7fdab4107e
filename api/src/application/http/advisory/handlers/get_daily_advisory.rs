use axum::extract::{Path, Query, State};
use chrono::{NaiveDate, Utc};
use mealwise_core::domain::advisory::{
    entities::AdvisoryReport, ports::AdvisoryService, value_objects::DailyAdvisoryInput,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetDailyAdvisoryQuery {
    /// Day to review, today (UTC) when omitted
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetDailyAdvisoryResponse {
    pub data: AdvisoryReport,
}

#[utoipa::path(
    get,
    path = "",
    tag = "advisory",
    summary = "Daily nutrition review",
    description = "Summarizes the day's meals and asks the language model for a review. The summary is always returned; the review is marked unavailable when the model cannot be reached.",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        GetDailyAdvisoryQuery,
    ),
    responses(
        (status = 200, body = GetDailyAdvisoryResponse)
    )
)]
pub async fn get_daily_advisory(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<GetDailyAdvisoryQuery>,
) -> Result<Response<GetDailyAdvisoryResponse>, ApiError> {
    let report = state
        .service
        .daily_advisory(DailyAdvisoryInput {
            user_id,
            day: query.day.unwrap_or_else(|| Utc::now().date_naive()),
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetDailyAdvisoryResponse { data: report }))
}
