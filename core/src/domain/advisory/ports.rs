use std::future::Future;

use crate::domain::{
    advisory::{entities::AdvisoryReport, value_objects::DailyAdvisoryInput},
    common::entities::app_errors::CoreError,
};

/// Client for a structured-output language model.
#[cfg_attr(test, mockall::automock)]
pub trait LLMClient: Send + Sync {
    fn generate_with_image(
        &self,
        prompt: String,
        image_data: Vec<u8>,
        response_schema: serde_json::Value,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    fn generate_with_text(
        &self,
        prompt: String,
        response_schema: serde_json::Value,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait AdvisoryService: Send + Sync {
    /// Nutrition summary of the day with a model-written review. Never fails because of
    /// the model; an unreachable model yields an `unavailable` status.
    fn daily_advisory(
        &self,
        input: DailyAdvisoryInput,
    ) -> impl Future<Output = Result<AdvisoryReport, CoreError>> + Send;
}
