use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::meal::entities::MealSlot;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordMealInput {
    pub user_id: Uuid,
    pub eaten_at: Option<DateTime<Utc>>,
    pub slot: MealSlot,
    pub food_name: String,
    pub calories: f64,
}
