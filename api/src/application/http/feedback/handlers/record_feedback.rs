use axum::extract::{Path, State};
use mealwise_core::domain::feedback::{
    entities::Feedback, ports::FeedbackService, value_objects::RecordFeedbackInput,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::{
    feedback::validators::RecordFeedbackValidator,
    server::{
        api_entities::{
            api_error::{ApiError, ValidateJson},
            response::Response,
        },
        app_state::AppState,
    },
};

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecordFeedbackResponse {
    pub data: Feedback,
}

#[utoipa::path(
    post,
    path = "",
    tag = "feedback",
    summary = "React to a food",
    description = "Records like, dislike or already-eaten. The preference model picks it up asynchronously.",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    request_body = RecordFeedbackValidator,
    responses(
        (status = 201, body = RecordFeedbackResponse, description = "Feedback recorded"),
        (status = 400, description = "Bad request")
    )
)]
pub async fn record_feedback(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<RecordFeedbackValidator>,
) -> Result<Response<RecordFeedbackResponse>, ApiError> {
    let feedback = state
        .service
        .record_feedback(RecordFeedbackInput {
            user_id,
            food_name: payload.food_name,
            reaction: payload.reaction,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::Created(RecordFeedbackResponse { data: feedback }))
}
