use axum::{Router, routing::get};
use utoipa::OpenApi;

use super::handlers::get_daily_advisory::{__path_get_daily_advisory, get_daily_advisory};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_daily_advisory))]
pub struct AdvisoryApiDoc;

pub fn advisory_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        &format!("{}/users/{{user_id}}/advisory", state.args.server.root_path),
        get(get_daily_advisory),
    )
}
