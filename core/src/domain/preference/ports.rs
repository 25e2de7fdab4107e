use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError, preference::entities::PreferenceModel,
};

/// Durable copy of published models. The in-memory store stays authoritative for reads.
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceModelRepository: Send + Sync {
    fn save(
        &self,
        model: PreferenceModel,
    ) -> impl Future<Output = Result<PreferenceModel, CoreError>> + Send;

    fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<PreferenceModel>, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait PreferenceService: Send + Sync {
    fn current_model(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<PreferenceModel, CoreError>> + Send;

    fn model_versions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<u64>, CoreError>> + Send;

    fn rollback_model(
        &self,
        user_id: Uuid,
        version: u64,
    ) -> impl Future<Output = Result<PreferenceModel, CoreError>> + Send;

    /// Full rebuild from stored history, outside the regular triggers.
    fn retrain(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<PreferenceModel, CoreError>> + Send;
}
