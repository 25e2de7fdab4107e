use axum::{Router, routing::get};
use utoipa::OpenApi;

use super::handlers::{
    get_recommendations::{__path_get_recommendations, get_recommendations},
    get_similar_foods::{__path_get_similar_foods, get_similar_foods},
};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_recommendations, get_similar_foods))]
pub struct RecommendationApiDoc;

pub fn recommendation_routes(state: AppState) -> Router<AppState> {
    let root_path = &state.args.server.root_path;

    Router::new()
        .route(
            &format!("{}/users/{{user_id}}/recommendations", root_path),
            get(get_recommendations),
        )
        .route(
            &format!("{}/users/{{user_id}}/similar-foods", root_path),
            get(get_similar_foods),
        )
}
