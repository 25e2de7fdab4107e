use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{
    advisory::ports::LLMClient,
    common::{entities::app_errors::CoreError, services::Service},
    events::MealwiseEvent,
    feedback::{
        entities::{Feedback, FeedbackConfig},
        ports::{FeedbackRepository, FeedbackService},
        value_objects::RecordFeedbackInput,
    },
    food::ports::FoodReferenceDatabase,
    learning::ports::CorrectionRepository,
    meal::ports::MealRecordRepository,
    preference::ports::PreferenceModelRepository,
    profile::ports::UserProfileRepository,
};

impl<M, F, P, CA, PM, D, LLM> FeedbackService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    #[instrument(skip(self, input), fields(user_id = %input.user_id, reaction = ?input.reaction))]
    async fn record_feedback(&self, input: RecordFeedbackInput) -> Result<Feedback, CoreError> {
        if input.food_name.trim().is_empty() {
            return Err(CoreError::InvalidInput("food name is required".to_string()));
        }

        let feedback = Feedback::new(FeedbackConfig {
            user_id: input.user_id,
            food_name: input.food_name,
            reaction: input.reaction,
        });
        let feedback = self.feedback_repository.append(feedback).await?;

        info!(feedback_id = %feedback.id, "feedback recorded");
        self.event_bus.publish(MealwiseEvent::FeedbackRecorded {
            feedback: feedback.clone(),
        });
        Ok(feedback)
    }

    async fn list_feedback(&self, user_id: Uuid) -> Result<Vec<Feedback>, CoreError> {
        self.feedback_repository.list_by_user(user_id).await
    }
}
