use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use utoipa::OpenApi;

use super::handlers::{
    get_pending_regions::{__path_get_pending_regions, get_pending_regions},
    recognize_image::{__path_recognize_image, MAX_IMAGE_SIZE, recognize_image},
    resolve_region::{__path_resolve_region, resolve_region},
};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(recognize_image, get_pending_regions, resolve_region))]
pub struct RecognitionApiDoc;

pub fn recognition_routes(state: AppState) -> Router<AppState> {
    let root_path = &state.args.server.root_path;

    Router::new()
        .route(
            &format!("{}/users/{{user_id}}/recognitions", root_path),
            post(recognize_image).layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 64 * 1024)),
        )
        .route(
            &format!("{}/users/{{user_id}}/regions/pending", root_path),
            get(get_pending_regions),
        )
        .route(
            &format!("{}/users/{{user_id}}/regions/{{region_id}}/resolve", root_path),
            post(resolve_region),
        )
}
