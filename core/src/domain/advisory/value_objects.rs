use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyAdvisoryInput {
    pub user_id: Uuid,
    pub day: NaiveDate,
}
