use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    meal::{entities::MealRecord, value_objects::RecordMealInput},
};

/// Append-only meal history, keyed by user.
#[cfg_attr(test, mockall::automock)]
pub trait MealRecordRepository: Send + Sync {
    fn append(
        &self,
        record: MealRecord,
    ) -> impl Future<Output = Result<MealRecord, CoreError>> + Send;

    /// All records of a user, oldest first.
    fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<MealRecord>, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait MealService: Send + Sync {
    /// Records a manually entered meal.
    fn record_meal(
        &self,
        input: RecordMealInput,
    ) -> impl Future<Output = Result<MealRecord, CoreError>> + Send;

    fn list_meals(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<MealRecord>, CoreError>> + Send;
}
