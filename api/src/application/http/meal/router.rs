use axum::{Router, routing::post};
use utoipa::OpenApi;

use super::handlers::{
    get_meals::{__path_get_meals, get_meals},
    record_meal::{__path_record_meal, record_meal},
};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(record_meal, get_meals))]
pub struct MealApiDoc;

pub fn meal_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        &format!("{}/users/{{user_id}}/meals", state.args.server.root_path),
        post(record_meal).get(get_meals),
    )
}
