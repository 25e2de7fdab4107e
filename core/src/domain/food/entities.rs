use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::food::helpers::normalize_food_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Staple,
    Protein,
    Vegetable,
    Fruit,
    Dairy,
    Snack,
    Drink,
}

/// Nutrient and flavor markers used by auxiliary-factor fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FoodTag {
    Iron,
    Protein,
    VitaminC,
    Folate,
    VitaminB,
    Zinc,
    Magnesium,
    Calcium,
    Fiber,
    Sweet,
    Spicy,
    Light,
    Savory,
    Sour,
    Fried,
}

impl FoodTag {
    pub fn is_flavor(&self) -> bool {
        matches!(
            self,
            FoodTag::Sweet | FoodTag::Spicy | FoodTag::Light | FoodTag::Savory | FoodTag::Sour
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FoodReference {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    /// kcal per 100 g (or 100 ml for drinks)
    pub calories: f64,
    pub category: FoodCategory,
    pub tags: Vec<FoodTag>,
    /// Population-level popularity in [0, 1], used for cold-start defaults.
    pub popularity: f64,
}

impl FoodReference {
    /// True when `name` is this food's name or one of its aliases after normalization.
    pub fn matches_name(&self, name: &str) -> bool {
        let needle = normalize_food_name(name);
        normalize_food_name(&self.name) == needle
            || self.aliases.iter().any(|a| normalize_food_name(a) == needle)
    }

    pub fn has_tag(&self, tag: FoodTag) -> bool {
        self.tags.contains(&tag)
    }
}
