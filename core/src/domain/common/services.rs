use std::sync::Arc;

use crate::domain::{
    advisory::ports::LLMClient,
    common::{MealwiseConfig, entities::app_errors::CoreError},
    events::EventBus,
    feedback::ports::FeedbackRepository,
    food::ports::FoodReferenceDatabase,
    learning::{optimizer::RecognitionLearningOptimizer, ports::CorrectionRepository},
    meal::ports::MealRecordRepository,
    preference::{ports::PreferenceModelRepository, store::ModelStore, trainer::PreferenceTrainer},
    profile::ports::UserProfileRepository,
    recognition::{merger::ConfidenceMerger, normalizer::CandidateNormalizer, pool::RecognitionBackendPool},
    recommendation::engine::RecommendationEngine,
    validation::{gate::ValidationGate, registry::RegionRegistry},
};

/// The pipeline: every stage plus the ports it reads and writes.
///
/// Cheap to clone; stages with state live behind `Arc`.
pub struct Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    pub meal_repository: M,
    pub feedback_repository: F,
    pub profile_repository: P,
    pub food_database: D,
    pub llm_client: LLM,
    pub pool: RecognitionBackendPool,
    pub normalizer: Arc<CandidateNormalizer>,
    pub merger: Arc<ConfidenceMerger>,
    pub gate: Arc<ValidationGate>,
    pub regions: Arc<RegionRegistry>,
    pub optimizer: Arc<RecognitionLearningOptimizer<CA>>,
    pub trainer: Arc<PreferenceTrainer<M, F, PM>>,
    pub models: Arc<ModelStore>,
    pub recommender: Arc<RecommendationEngine>,
    pub event_bus: Arc<EventBus>,
}

pub struct ServiceDependencies<M, F, P, CA, PM, D, LLM> {
    pub meal_repository: M,
    pub feedback_repository: F,
    pub profile_repository: P,
    pub correction_repository: CA,
    pub model_repository: PM,
    pub food_database: D,
    pub llm_client: LLM,
    pub pool: RecognitionBackendPool,
}

impl<M, F, P, CA, PM, D, LLM> Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository + Clone,
    F: FeedbackRepository + Clone,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    pub fn new(
        config: &MealwiseConfig,
        deps: ServiceDependencies<M, F, P, CA, PM, D, LLM>,
    ) -> Result<Self, CoreError> {
        let event_bus = Arc::new(EventBus::new());
        let models = Arc::new(ModelStore::new(config.preference.retained_versions));

        let optimizer = Arc::new(RecognitionLearningOptimizer::new(
            config.learning.clone(),
            config.merge.calorie_tolerance,
            deps.correction_repository,
        ));
        let trainer = Arc::new(PreferenceTrainer::new(
            config.preference.clone(),
            Arc::clone(&models),
            Arc::clone(&event_bus),
            deps.meal_repository.clone(),
            deps.feedback_repository.clone(),
            deps.model_repository,
        ));

        Ok(Self {
            meal_repository: deps.meal_repository,
            feedback_repository: deps.feedback_repository,
            profile_repository: deps.profile_repository,
            food_database: deps.food_database,
            llm_client: deps.llm_client,
            pool: deps.pool,
            normalizer: Arc::new(CandidateNormalizer::new()?),
            merger: Arc::new(ConfidenceMerger::new(config.merge.clone())),
            gate: Arc::new(ValidationGate::new(config.validation.clone())),
            regions: Arc::new(RegionRegistry::new(config.validation.awaiting_ttl)),
            optimizer,
            trainer,
            models,
            recommender: Arc::new(RecommendationEngine::new(config.recommendation.clone())),
            event_bus,
        })
    }
}

impl<M, F, P, CA, PM, D, LLM> Clone for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository + Clone,
    F: FeedbackRepository + Clone,
    P: UserProfileRepository + Clone,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase + Clone,
    LLM: LLMClient + Clone,
{
    fn clone(&self) -> Self {
        Self {
            meal_repository: self.meal_repository.clone(),
            feedback_repository: self.feedback_repository.clone(),
            profile_repository: self.profile_repository.clone(),
            food_database: self.food_database.clone(),
            llm_client: self.llm_client.clone(),
            pool: self.pool.clone(),
            normalizer: Arc::clone(&self.normalizer),
            merger: Arc::clone(&self.merger),
            gate: Arc::clone(&self.gate),
            regions: Arc::clone(&self.regions),
            optimizer: Arc::clone(&self.optimizer),
            trainer: Arc::clone(&self.trainer),
            models: Arc::clone(&self.models),
            recommender: Arc::clone(&self.recommender),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}
