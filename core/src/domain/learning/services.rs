use crate::domain::{
    advisory::ports::LLMClient,
    common::{entities::app_errors::CoreError, services::Service},
    feedback::ports::FeedbackRepository,
    food::ports::FoodReferenceDatabase,
    learning::{
        entities::LearningSnapshot,
        ports::{CorrectionRepository, LearningService},
    },
    meal::ports::MealRecordRepository,
    preference::ports::PreferenceModelRepository,
    profile::ports::UserProfileRepository,
};

impl<M, F, P, CA, PM, D, LLM> LearningService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    async fn learning_snapshot(&self) -> Result<LearningSnapshot, CoreError> {
        Ok(self.optimizer.snapshot().await)
    }
}
