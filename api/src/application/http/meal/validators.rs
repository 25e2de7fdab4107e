use chrono::{DateTime, Utc};
use mealwise_core::domain::meal::entities::MealSlot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordMealValidator {
    #[validate(length(min = 1, max = 200, message = "food_name is required"))]
    pub food_name: String,

    #[validate(range(min = 0.0, max = 20000.0, message = "calories must be between 0 and 20000"))]
    pub calories: f64,

    pub slot: MealSlot,

    #[serde(default)]
    pub eaten_at: Option<DateTime<Utc>>,
}
