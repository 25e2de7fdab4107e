use axum::{Router, routing::post};
use utoipa::OpenApi;

use super::handlers::{
    get_feedback::{__path_get_feedback, get_feedback},
    record_feedback::{__path_record_feedback, record_feedback},
};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(record_feedback, get_feedback))]
pub struct FeedbackApiDoc;

pub fn feedback_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        &format!("{}/users/{{user_id}}/feedback", state.args.server.root_path),
        post(record_feedback).get(get_feedback),
    )
}
