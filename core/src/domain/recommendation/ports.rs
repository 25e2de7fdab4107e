use std::future::Future;

use crate::domain::{
    common::entities::app_errors::CoreError,
    preference::entities::SimilarFood,
    recommendation::{
        entities::Recommendation,
        value_objects::{RecommendInput, SimilarFoodsInput},
    },
};

#[cfg_attr(test, mockall::automock)]
pub trait RecommendationService: Send + Sync {
    fn recommend(
        &self,
        input: RecommendInput,
    ) -> impl Future<Output = Result<Recommendation, CoreError>> + Send;

    fn similar_foods(
        &self,
        input: SimilarFoodsInput,
    ) -> impl Future<Output = Result<Vec<SimilarFood>, CoreError>> + Send;
}
