use axum::extract::{Path, State};
use mealwise_core::domain::feedback::{entities::Feedback, ports::FeedbackService};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GetFeedbackResponse {
    pub data: Vec<Feedback>,
}

#[utoipa::path(
    get,
    path = "",
    tag = "feedback",
    summary = "Feedback history",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 200, body = GetFeedbackResponse)
    )
)]
pub async fn get_feedback(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Response<GetFeedbackResponse>, ApiError> {
    let feedback = state
        .service
        .list_feedback(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(GetFeedbackResponse { data: feedback }))
}
