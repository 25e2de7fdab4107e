use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::food::entities::FoodCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    Personalized,
    /// Population defaults for users without enough history or without a model.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RationaleTag {
    PopularDefault,
    HistoricalFavorite,
    LikedBefore,
    CyclePhaseSupport,
    PersonalityMatch,
    RecentlyEaten,
    NewToYou,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecommendedFood {
    pub food_name: String,
    pub score: f64,
    pub base_score: f64,
    pub calories: Option<f64>,
    pub category: Option<FoodCategory>,
    pub rationale: Vec<RationaleTag>,
}

/// A full meal for one slot, assembled from ranked foods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MealCombination {
    pub foods: Vec<RecommendedFood>,
    pub total_calories: f64,
    /// The slot's share of the daily calorie target.
    pub calorie_target: f64,
    /// Distinct categories over template categories.
    pub balance_score: f64,
    pub calorie_fit: f64,
    pub score: f64,
}

impl MealCombination {
    /// Food names in alphabetical order.
    pub fn food_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.foods.iter().map(|f| f.food_name.as_str()).collect();
        names.sort();
        names
    }
}

/// Ranked suggestions for one user and day. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub tier: RecommendationTier,
    pub model_version: Option<u64>,
    pub items: Vec<RecommendedFood>,
    /// Ranked meals for the requested slot; empty when no slot was given.
    #[serde(default)]
    pub combinations: Vec<MealCombination>,
    pub generated_at: DateTime<Utc>,
}
