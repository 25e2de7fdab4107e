use tracing::{instrument, warn};

use crate::domain::{
    advisory::ports::LLMClient,
    common::{entities::app_errors::CoreError, generate_timestamp, services::Service},
    feedback::ports::FeedbackRepository,
    food::ports::FoodReferenceDatabase,
    learning::ports::CorrectionRepository,
    meal::ports::MealRecordRepository,
    preference::{entities::{PreferenceModel, SimilarFood}, ports::PreferenceModelRepository},
    profile::{entities::UserProfile, ports::UserProfileRepository},
    recommendation::{
        engine::RankingInput,
        entities::Recommendation,
        ports::RecommendationService,
        value_objects::{RecommendInput, SimilarFoodsInput},
    },
};

impl<M, F, P, CA, PM, D, LLM> RecommendationService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    #[instrument(skip(self, input), fields(user_id = %input.user_id, day = %input.day))]
    async fn recommend(&self, input: RecommendInput) -> Result<Recommendation, CoreError> {
        let catalog = self.food_database.catalog().await.unwrap_or_else(|e| {
            warn!("food catalog unavailable, ranking history only: {}", e);
            Vec::new()
        });
        let history = self.meal_repository.list_by_user(input.user_id).await?;
        let feedback = self.feedback_repository.list_by_user(input.user_id).await?;
        let profile = self
            .profile_repository
            .get(input.user_id)
            .await?
            .unwrap_or_else(|| UserProfile::empty(input.user_id));

        // one model version for the whole call
        self.trainer.load_persisted(input.user_id).await;
        let model = self.models.current(input.user_id).await;

        Ok(self.recommender.rank(RankingInput {
            user_id: input.user_id,
            day: input.day,
            slot: input.slot,
            catalog: &catalog,
            history: &history,
            feedback: &feedback,
            profile: &profile,
            model,
            now: generate_timestamp().0,
        }))
    }

    async fn similar_foods(&self, input: SimilarFoodsInput) -> Result<Vec<SimilarFood>, CoreError> {
        if input.food_name.trim().is_empty() {
            return Err(CoreError::InvalidInput("food name is required".to_string()));
        }

        let catalog = self.food_database.catalog().await.unwrap_or_else(|e| {
            warn!("food catalog unavailable: {}", e);
            Vec::new()
        });
        let history = self.meal_repository.list_by_user(input.user_id).await?;
        let names: Vec<String> = catalog
            .into_iter()
            .map(|f| f.name)
            .chain(history.into_iter().map(|r| r.food_name))
            .collect();

        self.trainer.load_persisted(input.user_id).await;
        let similar = match self.models.current(input.user_id).await {
            Some(model) => model.similar_foods(&input.food_name, &names, input.limit),
            None => PreferenceModel::untrained(input.user_id).similar_foods(
                &input.food_name,
                &names,
                input.limit,
            ),
        };
        Ok(similar)
    }
}
