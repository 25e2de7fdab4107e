use axum::{
    Router,
    routing::{get, post},
};
use utoipa::OpenApi;

use super::handlers::{
    get_current_model::{__path_get_current_model, get_current_model},
    get_model_versions::{__path_get_model_versions, get_model_versions},
    retrain_model::{__path_retrain_model, retrain_model},
    rollback_model::{__path_rollback_model, rollback_model},
};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_current_model, get_model_versions, rollback_model, retrain_model))]
pub struct PreferenceApiDoc;

pub fn preference_routes(state: AppState) -> Router<AppState> {
    let base = format!(
        "{}/users/{{user_id}}/preference-model",
        state.args.server.root_path
    );

    Router::new()
        .route(&base, get(get_current_model))
        .route(&format!("{}/versions", base), get(get_model_versions))
        .route(&format!("{}/rollback", base), post(rollback_model))
        .route(&format!("{}/retrain", base), post(retrain_model))
}
