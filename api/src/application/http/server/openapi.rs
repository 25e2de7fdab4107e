use crate::application::http::{
    advisory::router::AdvisoryApiDoc, feedback::router::FeedbackApiDoc,
    learning::router::LearningApiDoc, meal::router::MealApiDoc,
    preference::router::PreferenceApiDoc, profile::router::ProfileApiDoc,
    recognition::router::RecognitionApiDoc, recommendation::router::RecommendationApiDoc,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mealwise API"
    ),
    nest(
        (path = "/users/{user_id}", api = RecognitionApiDoc),
        (path = "/users/{user_id}/meals", api = MealApiDoc),
        (path = "/users/{user_id}/feedback", api = FeedbackApiDoc),
        (path = "/users/{user_id}/profile", api = ProfileApiDoc),
        (path = "/users/{user_id}", api = RecommendationApiDoc),
        (path = "/users/{user_id}/preference-model", api = PreferenceApiDoc),
        (path = "/users/{user_id}/advisory", api = AdvisoryApiDoc),
        (path = "/learning", api = LearningApiDoc),
    )
)]
pub struct ApiDoc;
