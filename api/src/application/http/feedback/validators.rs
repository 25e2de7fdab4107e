use mealwise_core::domain::feedback::entities::Reaction;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordFeedbackValidator {
    #[validate(length(min = 1, max = 200, message = "food_name is required"))]
    pub food_name: String,

    pub reaction: Reaction,
}
