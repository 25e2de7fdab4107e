use axum::extract::{Multipart, Path, State};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use mealwise_core::domain::{
    meal::entities::MealSlot,
    recognition::{
        ports::RecognitionService,
        value_objects::{RecognitionResult, RecognizeInput},
    },
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::http::server::{
    api_entities::{api_error::ApiError, response::Response},
    app_state::AppState,
};

pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecognizeImageForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    pub slot: MealSlot,
    /// RFC 3339; defaults to now
    pub eaten_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecognizeImageResponse {
    pub data: RecognitionResult,
}

#[utoipa::path(
    post,
    path = "/recognitions",
    tag = "recognition",
    summary = "Recognize a food label photo",
    description = "Runs the photo through every recognition backend, merges the candidates and applies the validation gate. Confident regions become meal records, ambiguous ones await confirmation.",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    request_body(content = RecognizeImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = RecognizeImageResponse),
        (status = 400, description = "Missing image or invalid slot")
    )
)]
pub async fn recognize_image(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response<RecognizeImageResponse>, ApiError> {
    let mut image: Option<Bytes> = None;
    let mut slot: Option<MealSlot> = None;
    let mut eaten_at: Option<DateTime<Utc>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {}", e)))?;

                if data.len() > MAX_IMAGE_SIZE {
                    return Err(ApiError::BadRequest(format!(
                        "Image too large. Max size is {} bytes",
                        MAX_IMAGE_SIZE
                    )));
                }

                image = Some(data);
            }
            "slot" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read slot: {}", e)))?;
                slot = Some(value.parse::<MealSlot>().map_err(ApiError::from)?);
            }
            "eaten_at" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read eaten_at: {}", e)))?;
                let parsed = DateTime::parse_from_rfc3339(value.trim())
                    .map_err(|_| ApiError::BadRequest("Invalid eaten_at format".to_string()))?;
                eaten_at = Some(parsed.with_timezone(&Utc));
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| ApiError::BadRequest("Missing image field".to_string()))?;
    let slot = slot.ok_or_else(|| ApiError::BadRequest("Missing slot field".to_string()))?;

    let result = state
        .service
        .recognize(RecognizeInput {
            user_id,
            slot,
            eaten_at,
            image,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(RecognizeImageResponse { data: result }))
}
