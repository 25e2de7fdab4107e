use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    advisory::ports::LLMClient,
    common::{entities::app_errors::CoreError, generate_timestamp, services::Service},
    feedback::ports::FeedbackRepository,
    food::ports::FoodReferenceDatabase,
    learning::ports::CorrectionRepository,
    meal::ports::MealRecordRepository,
    preference::ports::PreferenceModelRepository,
    profile::{
        entities::UserProfile,
        ports::{ProfileService, UserProfileRepository},
        value_objects::UpdateProfileInput,
    },
};

const MAX_CYCLE_LENGTH_DAYS: u32 = 60;

impl<M, F, P, CA, PM, D, LLM> ProfileService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, CoreError> {
        Ok(self
            .profile_repository
            .get(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::empty(user_id)))
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn update_profile(&self, input: UpdateProfileInput) -> Result<UserProfile, CoreError> {
        if let Some(cycle) = &input.cycle {
            if cycle.cycle_length_days > MAX_CYCLE_LENGTH_DAYS {
                return Err(CoreError::InvalidInput(format!(
                    "cycle length must be at most {} days",
                    MAX_CYCLE_LENGTH_DAYS
                )));
            }
        }

        let mut profile = self.get_profile(input.user_id).await?;
        if let Some(cycle) = input.cycle {
            profile.cycle = Some(cycle);
        }
        if let Some(zodiac) = input.zodiac {
            profile.zodiac = Some(zodiac);
        }
        if let Some(personality) = input.personality {
            profile.personality = personality;
        }
        if let Some(questionnaire) = input.questionnaire {
            profile.questionnaire = questionnaire;
        }
        profile.updated_at = generate_timestamp().0;

        self.profile_repository.upsert(profile).await
    }
}
