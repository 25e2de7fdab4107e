use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    profile::{entities::UserProfile, value_objects::UpdateProfileInput},
};

#[cfg_attr(test, mockall::automock)]
pub trait UserProfileRepository: Send + Sync {
    fn get(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<UserProfile>, CoreError>> + Send;

    fn upsert(
        &self,
        profile: UserProfile,
    ) -> impl Future<Output = Result<UserProfile, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait ProfileService: Send + Sync {
    /// Stored profile, or an empty one for users that never set it.
    fn get_profile(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<UserProfile, CoreError>> + Send;

    fn update_profile(
        &self,
        input: UpdateProfileInput,
    ) -> impl Future<Output = Result<UserProfile, CoreError>> + Send;
}
