use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    feedback::{entities::Feedback, value_objects::RecordFeedbackInput},
};

#[cfg_attr(test, mockall::automock)]
pub trait FeedbackRepository: Send + Sync {
    fn append(&self, feedback: Feedback)
    -> impl Future<Output = Result<Feedback, CoreError>> + Send;

    /// All feedback of a user, oldest first.
    fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Feedback>, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait FeedbackService: Send + Sync {
    fn record_feedback(
        &self,
        input: RecordFeedbackInput,
    ) -> impl Future<Output = Result<Feedback, CoreError>> + Send;

    fn list_feedback(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Feedback>, CoreError>> + Send;
}
