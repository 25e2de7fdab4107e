use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::common::{entities::app_errors::CoreError, generate_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
        }
    }
}

impl FromStr for MealSlot {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            "snack" => Ok(MealSlot::Snack),
            other => Err(CoreError::InvalidInput(format!("unknown meal slot '{}'", other))),
        }
    }
}

/// How a meal record came to exist. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Manual,
    OcrConfirmed,
    OcrCorrected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub eaten_at: DateTime<Utc>,
    pub slot: MealSlot,
    pub food_name: String,
    pub calories: f64,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MealRecordConfig {
    pub user_id: Uuid,
    pub eaten_at: DateTime<Utc>,
    pub slot: MealSlot,
    pub food_name: String,
    pub calories: f64,
    pub provenance: Provenance,
}

impl MealRecord {
    pub fn new(config: MealRecordConfig) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            user_id: config.user_id,
            eaten_at: config.eaten_at,
            slot: config.slot,
            food_name: config.food_name.trim().to_string(),
            calories: config.calories,
            provenance: config.provenance,
            created_at: now,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.eaten_at.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_parsing() {
        assert_eq!("Lunch".parse::<MealSlot>().unwrap(), MealSlot::Lunch);
        assert_eq!(" snack ".parse::<MealSlot>().unwrap(), MealSlot::Snack);
        assert!("brunch".parse::<MealSlot>().is_err());
    }
}
