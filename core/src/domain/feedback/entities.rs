use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::common::generate_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Like,
    Dislike,
    AlreadyEaten,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub reaction: Reaction,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub user_id: Uuid,
    pub food_name: String,
    pub reaction: Reaction,
}

impl Feedback {
    pub fn new(config: FeedbackConfig) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            user_id: config.user_id,
            food_name: config.food_name.trim().to_string(),
            reaction: config.reaction,
            created_at: now,
        }
    }
}
