pub mod get_meals;
pub mod record_meal;
