use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::meal::entities::MealSlot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SlotSummary {
    pub slot: MealSlot,
    pub calories: f64,
    pub foods: Vec<String>,
}

/// Per-slot and total intake for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NutritionSummary {
    pub day: NaiveDate,
    pub total_calories: f64,
    pub record_count: usize,
    pub slots: Vec<SlotSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdvisoryStatus {
    Available {
        analysis: String,
        suggestions: Vec<String>,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdvisoryReport {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub summary: NutritionSummary,
    pub advisory: AdvisoryStatus,
    pub generated_at: DateTime<Utc>,
}

/// Structured body returned by the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryResponse {
    pub analysis: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}
