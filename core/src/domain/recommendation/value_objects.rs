use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::meal::entities::MealSlot;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecommendInput {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub slot: Option<MealSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SimilarFoodsInput {
    pub user_id: Uuid,
    pub food_name: String,
    pub limit: usize,
}
