use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    advisory::ports::LLMClient,
    common::{entities::app_errors::CoreError, generate_timestamp, services::Service},
    feedback::ports::FeedbackRepository,
    food::ports::FoodReferenceDatabase,
    learning::ports::CorrectionRepository,
    meal::{
        entities::{MealRecord, MealRecordConfig, Provenance},
        ports::{MealRecordRepository, MealService},
        value_objects::RecordMealInput,
    },
    preference::ports::PreferenceModelRepository,
    profile::ports::UserProfileRepository,
};

impl<M, F, P, CA, PM, D, LLM> MealService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn record_meal(&self, input: RecordMealInput) -> Result<MealRecord, CoreError> {
        if input.food_name.trim().is_empty() {
            return Err(CoreError::InvalidInput("food name is required".to_string()));
        }
        if !input.calories.is_finite() || input.calories < 0.0 {
            return Err(CoreError::InvalidInput(
                "calories must be a non-negative number".to_string(),
            ));
        }

        let record = MealRecord::new(MealRecordConfig {
            user_id: input.user_id,
            eaten_at: input.eaten_at.unwrap_or_else(|| generate_timestamp().0),
            slot: input.slot,
            food_name: input.food_name,
            calories: input.calories,
            provenance: Provenance::Manual,
        });

        self.store_record(record).await
    }

    async fn list_meals(&self, user_id: Uuid) -> Result<Vec<MealRecord>, CoreError> {
        self.meal_repository.list_by_user(user_id).await
    }
}
