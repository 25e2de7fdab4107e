use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::feedback::entities::Reaction;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordFeedbackInput {
    pub user_id: Uuid,
    pub food_name: String,
    pub reaction: Reaction,
}
