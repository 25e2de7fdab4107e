use std::collections::BTreeSet;

use crate::domain::{
    food::entities::FoodCategory,
    meal::entities::MealSlot,
    recommendation::entities::{MealCombination, RecommendedFood},
};

/// Highest-ranked foods tried per template category.
const CHOICES_PER_CATEGORY: usize = 2;

const PREFERENCE_WEIGHT: f64 = 0.4;
const BALANCE_WEIGHT: f64 = 0.3;
const CALORIE_FIT_WEIGHT: f64 = 0.3;

/// Share of the daily calorie target a slot is expected to cover.
pub fn calorie_share(slot: MealSlot) -> f64 {
    match slot {
        MealSlot::Breakfast => 0.25,
        MealSlot::Lunch => 0.35,
        MealSlot::Dinner => 0.3,
        MealSlot::Snack => 0.1,
    }
}

/// Category layouts a meal in the slot is assembled from.
fn templates(slot: MealSlot) -> &'static [&'static [FoodCategory]] {
    use FoodCategory::*;

    match slot {
        MealSlot::Breakfast => &[&[Staple, Protein, Dairy], &[Staple, Fruit, Drink]],
        MealSlot::Lunch => &[&[Staple, Protein, Vegetable], &[Protein, Vegetable, Fruit]],
        MealSlot::Dinner => &[&[Staple, Protein, Vegetable], &[Protein, Vegetable]],
        MealSlot::Snack => &[&[Fruit, Dairy], &[Fruit, Snack], &[Snack, Drink]],
    }
}

/// Assembles meals for `slot` from already ranked foods and ranks them by preference,
/// category balance and closeness to `calorie_target`.
///
/// Foods without a category or calorie value cannot fill a template slot.
pub fn combine(
    slot: MealSlot,
    ranked: &[RecommendedFood],
    calorie_target: f64,
    limit: usize,
) -> Vec<MealCombination> {
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut combinations = Vec::new();

    for template in templates(slot) {
        let choices: Option<Vec<Vec<&RecommendedFood>>> = template
            .iter()
            .map(|category| {
                let picks: Vec<&RecommendedFood> = ranked
                    .iter()
                    .filter(|f| f.category == Some(*category) && f.calories.is_some())
                    .take(CHOICES_PER_CATEGORY)
                    .collect();
                (!picks.is_empty()).then_some(picks)
            })
            .collect();
        let Some(choices) = choices else {
            continue;
        };

        for foods in cartesian(&choices) {
            let mut key: Vec<String> = foods.iter().map(|f| f.food_name.clone()).collect();
            key.sort();
            key.dedup();
            if key.len() < foods.len() || !seen.insert(key) {
                continue;
            }
            combinations.push(score(foods, template.len(), calorie_target));
        }
    }

    combinations.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.food_names().cmp(&b.food_names()))
    });
    combinations.truncate(limit);
    combinations
}

fn cartesian<'a>(choices: &[Vec<&'a RecommendedFood>]) -> Vec<Vec<&'a RecommendedFood>> {
    choices.iter().fold(vec![Vec::new()], |acc, options| {
        acc.into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |option| {
                    let mut next = prefix.clone();
                    next.push(*option);
                    next
                })
            })
            .collect()
    })
}

fn score(foods: Vec<&RecommendedFood>, slots: usize, calorie_target: f64) -> MealCombination {
    let total_calories: f64 = foods.iter().filter_map(|f| f.calories).sum();
    let preference = foods.iter().map(|f| f.score).sum::<f64>() / foods.len() as f64;

    let categories: BTreeSet<FoodCategory> = foods.iter().filter_map(|f| f.category).collect();
    let balance = categories.len() as f64 / slots.max(1) as f64;

    let calorie_fit = if calorie_target > 0.0 {
        1.0 - ((total_calories - calorie_target).abs() / calorie_target).min(1.0)
    } else {
        0.0
    };

    MealCombination {
        foods: foods.into_iter().cloned().collect(),
        total_calories,
        calorie_target,
        balance_score: balance,
        calorie_fit,
        score: PREFERENCE_WEIGHT * preference
            + BALANCE_WEIGHT * balance
            + CALORIE_FIT_WEIGHT * calorie_fit,
    }
}
