use axum::{Router, routing::get};
use utoipa::OpenApi;

use super::handlers::get_learning_snapshot::{__path_get_learning_snapshot, get_learning_snapshot};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_learning_snapshot))]
pub struct LearningApiDoc;

pub fn learning_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        &format!("{}/learning/snapshot", state.args.server.root_path),
        get(get_learning_snapshot),
    )
}
