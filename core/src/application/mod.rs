use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    domain::{
        advisory::ports::LLMClient,
        common::{
            MealwiseConfig,
            services::{Service, ServiceDependencies},
        },
        events::{EventKind, MealwiseEvent},
        feedback::ports::FeedbackRepository,
        food::ports::FoodReferenceDatabase,
        learning::ports::CorrectionRepository,
        meal::ports::MealRecordRepository,
        preference::ports::PreferenceModelRepository,
        profile::ports::UserProfileRepository,
        recognition::pool::RecognitionBackendPool,
    },
    infrastructure::{
        feedback::InMemoryFeedbackRepository,
        food::InMemoryFoodDatabase,
        learning::InMemoryCorrectionRepository,
        llm::gemini_client::GeminiLLMClient,
        meal::InMemoryMealRecordRepository,
        preference::InMemoryPreferenceModelRepository,
        profile::InMemoryProfileRepository,
        recognition::{http_ocr::HttpOcrRecognizer, vision_llm::VisionLLMRecognizer},
    },
};

pub const VISION_LLM_BACKEND: &str = "vision-llm";

pub type MealwiseService = Service<
    InMemoryMealRecordRepository,
    InMemoryFeedbackRepository,
    InMemoryProfileRepository,
    InMemoryCorrectionRepository,
    InMemoryPreferenceModelRepository,
    InMemoryFoodDatabase,
    GeminiLLMClient,
>;

pub async fn create_service(config: MealwiseConfig) -> Result<MealwiseService, anyhow::Error> {
    let llm_client = GeminiLLMClient::new(&config.llm);

    let mut pool = RecognitionBackendPool::new(config.recognition.backend_timeout);
    if let Some(ocr) = &config.ocr_service {
        pool.register(Arc::new(HttpOcrRecognizer::new(
            ocr.backend_id.clone(),
            ocr.endpoint.clone(),
        )));
    }
    if llm_client.is_configured() {
        pool.register(Arc::new(VisionLLMRecognizer::new(
            VISION_LLM_BACKEND,
            llm_client.clone(),
        )));
    }
    if pool.is_empty() {
        warn!("no recognition backend configured, photographed meals will need manual entry");
    } else {
        info!(backends = ?pool.backend_ids(), "recognition backends registered");
    }

    let service = Service::new(
        &config,
        ServiceDependencies {
            meal_repository: InMemoryMealRecordRepository::new(),
            feedback_repository: InMemoryFeedbackRepository::new(),
            profile_repository: InMemoryProfileRepository::new(),
            correction_repository: InMemoryCorrectionRepository::new(),
            model_repository: InMemoryPreferenceModelRepository::new(),
            food_database: InMemoryFoodDatabase::seeded(),
            llm_client,
            pool,
        },
    )?;

    Ok(service)
}

/// Starts the optimizer, the trainer and the awaiting-region sweep.
///
/// Subscriptions are taken before this returns, so no event published afterwards is
/// missed. All tasks stop when `cancel` fires.
pub fn spawn_background<M, F, P, CA, PM, D, LLM>(
    service: &Service<M, F, P, CA, PM, D, LLM>,
    config: &MealwiseConfig,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>>
where
    M: MealRecordRepository + 'static,
    F: FeedbackRepository + 'static,
    P: UserProfileRepository,
    CA: CorrectionRepository + 'static,
    PM: PreferenceModelRepository + 'static,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    let corrections = service
        .event_bus
        .subscribe(&[EventKind::CorrectionSubmitted]);
    let training = service
        .event_bus
        .subscribe(&[EventKind::MealRecorded, EventKind::FeedbackRecorded]);

    let optimizer = tokio::spawn(Arc::clone(&service.optimizer).run(corrections, cancel.clone()));
    let trainer = tokio::spawn(Arc::clone(&service.trainer).run(training, cancel.clone()));

    let regions = Arc::clone(&service.regions);
    let gate = Arc::clone(&service.gate);
    let event_bus = Arc::clone(&service.event_bus);
    let interval = config.validation.sweep_interval;
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let now = Utc::now();
                    for region in regions.sweep(&gate, now).await {
                        info!(region_id = %region.id, "awaiting region expired");
                        event_bus.publish(MealwiseEvent::RegionRejected {
                            region_id: region.id,
                            user_id: region.user_id,
                            reason: "confirmation timed out".to_string(),
                            timestamp: now,
                        });
                    }
                }
            }
        }
    });

    vec![optimizer, trainer, sweeper]
}
