use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError, learning::entities::LearningSnapshot,
    validation::entities::Correction,
};

/// Archive of corrections already consumed by the optimizer.
#[cfg_attr(test, mockall::automock)]
pub trait CorrectionRepository: Send + Sync {
    fn archive(
        &self,
        correction: Correction,
    ) -> impl Future<Output = Result<Correction, CoreError>> + Send;

    fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Correction>, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait LearningService: Send + Sync {
    /// Current backend trust-weights and merge-rule weights.
    fn learning_snapshot(&self) -> impl Future<Output = Result<LearningSnapshot, CoreError>> + Send;
}
