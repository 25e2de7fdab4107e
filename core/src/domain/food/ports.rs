use std::future::Future;

use crate::domain::{common::entities::app_errors::CoreError, food::entities::FoodReference};

/// Reference food database used to cross-check recognized labels and to seed recommendations.
#[cfg_attr(test, mockall::automock)]
pub trait FoodReferenceDatabase: Send + Sync {
    /// Exact or fuzzy lookup by name. `Ok(None)` when nothing is close enough.
    fn lookup(
        &self,
        name: String,
    ) -> impl Future<Output = Result<Option<FoodReference>, CoreError>> + Send;

    fn catalog(&self) -> impl Future<Output = Result<Vec<FoodReference>, CoreError>> + Send;
}
