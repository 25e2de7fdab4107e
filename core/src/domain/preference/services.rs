use uuid::Uuid;

use crate::domain::{
    advisory::ports::LLMClient,
    common::{entities::app_errors::CoreError, services::Service},
    feedback::ports::FeedbackRepository,
    food::ports::FoodReferenceDatabase,
    learning::ports::CorrectionRepository,
    meal::ports::MealRecordRepository,
    preference::{
        entities::PreferenceModel,
        ports::{PreferenceModelRepository, PreferenceService},
    },
    profile::ports::UserProfileRepository,
};

impl<M, F, P, CA, PM, D, LLM> PreferenceService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    async fn current_model(&self, user_id: Uuid) -> Result<PreferenceModel, CoreError> {
        self.trainer.load_persisted(user_id).await;
        self.models
            .current(user_id)
            .await
            .map(|model| (*model).clone())
            .ok_or(CoreError::NotFound)
    }

    async fn model_versions(&self, user_id: Uuid) -> Result<Vec<u64>, CoreError> {
        self.trainer.load_persisted(user_id).await;
        Ok(self.models.versions(user_id).await)
    }

    async fn rollback_model(
        &self,
        user_id: Uuid,
        version: u64,
    ) -> Result<PreferenceModel, CoreError> {
        self.trainer.load_persisted(user_id).await;
        let model = self.models.rollback(user_id, version).await?;
        Ok((*model).clone())
    }

    async fn retrain(&self, user_id: Uuid) -> Result<PreferenceModel, CoreError> {
        let model = self.trainer.retrain_full(user_id).await?;
        Ok((*model).clone())
    }
}
