pub mod get_recommendations;
pub mod get_similar_foods;
