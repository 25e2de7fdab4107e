use std::{collections::BTreeMap, sync::Arc, time::Duration};

use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::BoxFuture;
use mealwise_core::{
    application::spawn_background,
    domain::{
        advisory::ports::{AdvisoryService, LLMClient},
        advisory::{entities::AdvisoryStatus, value_objects::DailyAdvisoryInput},
        common::{
            MealwiseConfig,
            entities::app_errors::CoreError,
            services::{Service, ServiceDependencies},
        },
        feedback::{entities::Reaction, ports::FeedbackService, value_objects::RecordFeedbackInput},
        meal::{
            entities::{MealSlot, Provenance},
            ports::MealService,
            value_objects::RecordMealInput,
        },
        preference::{
            entities::{PreferenceModel, TrainingKind},
            ports::{PreferenceModelRepository, PreferenceService},
        },
        recognition::{
            entities::{BackendId, BackendStatus, ImageInput, RecognitionCandidate, RegionLocator},
            pool::RecognitionBackendPool,
            ports::{RecognitionService, Recognizer},
            value_objects::{RecognizeInput, ResolveRegionInput},
        },
        recommendation::{
            entities::{RationaleTag, RecommendationTier},
            ports::RecommendationService,
            value_objects::RecommendInput,
        },
        validation::entities::{RegionState, UserChoice},
    },
    infrastructure::{
        feedback::InMemoryFeedbackRepository, food::InMemoryFoodDatabase,
        learning::InMemoryCorrectionRepository, meal::InMemoryMealRecordRepository,
        preference::InMemoryPreferenceModelRepository, profile::InMemoryProfileRepository,
    },
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A backend that always reads the same label.
struct FixedLabel {
    id: &'static str,
    text: &'static str,
    confidence: f64,
}

impl Recognizer for FixedLabel {
    fn id(&self) -> BackendId {
        BackendId::new(self.id)
    }

    fn recognize<'a>(
        &'a self,
        _image: &'a ImageInput,
    ) -> BoxFuture<'a, Result<Vec<RecognitionCandidate>, CoreError>> {
        Box::pin(async move {
            Ok(vec![RecognitionCandidate::raw(
                self.id(),
                self.text,
                RegionLocator::whole_image(),
                self.confidence,
            )])
        })
    }
}

struct Broken;

impl Recognizer for Broken {
    fn id(&self) -> BackendId {
        BackendId::new("broken")
    }

    fn recognize<'a>(
        &'a self,
        _image: &'a ImageInput,
    ) -> BoxFuture<'a, Result<Vec<RecognitionCandidate>, CoreError>> {
        Box::pin(async {
            Err(CoreError::BackendFailure {
                backend: "broken".to_string(),
                reason: "connection refused".to_string(),
            })
        })
    }
}

#[derive(Clone)]
struct OfflineLLM;

impl LLMClient for OfflineLLM {
    async fn generate_with_image(
        &self,
        _prompt: String,
        _image_data: Vec<u8>,
        _schema: Value,
    ) -> Result<String, CoreError> {
        Err(CoreError::ExternalServiceError("offline".to_string()))
    }

    async fn generate_with_text(&self, _prompt: String, _schema: Value) -> Result<String, CoreError> {
        Err(CoreError::ExternalServiceError("offline".to_string()))
    }
}

type TestService = Service<
    InMemoryMealRecordRepository,
    InMemoryFeedbackRepository,
    InMemoryProfileRepository,
    InMemoryCorrectionRepository,
    InMemoryPreferenceModelRepository,
    InMemoryFoodDatabase,
    OfflineLLM,
>;

fn service_with(pool: RecognitionBackendPool, food_database: InMemoryFoodDatabase) -> TestService {
    service_with_models(pool, food_database, InMemoryPreferenceModelRepository::new())
}

fn service_with_models(
    pool: RecognitionBackendPool,
    food_database: InMemoryFoodDatabase,
    model_repository: InMemoryPreferenceModelRepository,
) -> TestService {
    Service::new(
        &MealwiseConfig::default(),
        ServiceDependencies {
            meal_repository: InMemoryMealRecordRepository::new(),
            feedback_repository: InMemoryFeedbackRepository::new(),
            profile_repository: InMemoryProfileRepository::new(),
            correction_repository: InMemoryCorrectionRepository::new(),
            model_repository,
            food_database,
            llm_client: OfflineLLM,
            pool,
        },
    )
    .unwrap()
}

fn apple_pool() -> RecognitionBackendPool {
    RecognitionBackendPool::new(Duration::from_secs(2))
        .with_backend(Arc::new(FixedLabel {
            id: "ocr-a",
            text: "apple 95 kcal",
            confidence: 0.9,
        }))
        .with_backend(Arc::new(FixedLabel {
            id: "ocr-b",
            text: "apple 52 kcal",
            confidence: 0.6,
        }))
}

fn photo(user_id: Uuid) -> RecognizeInput {
    RecognizeInput {
        user_id,
        slot: MealSlot::Snack,
        eaten_at: None,
        image: Bytes::from_static(b"\x89PNG fake label photo"),
    }
}

async fn record_history(service: &TestService, user_id: Uuid, days: i64, per_day: &[&str]) {
    let now = Utc::now();
    for day in 1..=days {
        for (i, name) in per_day.iter().enumerate() {
            service
                .record_meal(RecordMealInput {
                    user_id,
                    eaten_at: Some(now - ChronoDuration::days(day) + ChronoDuration::minutes(i as i64)),
                    slot: MealSlot::Lunch,
                    food_name: name.to_string(),
                    calories: 200.0,
                })
                .await
                .unwrap();
        }
    }
}

async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_database_agreement_favors_canonical_apple_value() {
    let service = service_with(apple_pool(), InMemoryFoodDatabase::seeded());
    let result = service.recognize(photo(Uuid::new_v4())).await.unwrap();

    assert_eq!(result.regions.len(), 1);
    let top = &result.regions[0].candidates[0];
    assert_eq!(top.food_name, "apple");
    assert_eq!(top.calories, 52.0);
    assert_eq!(top.database_match.as_ref().unwrap().reference_id, "apple");

    let without_db = service_with(apple_pool(), InMemoryFoodDatabase::new(Vec::new()));
    let baseline = without_db.recognize(photo(Uuid::new_v4())).await.unwrap();
    let baseline_top = &baseline.regions[0].candidates[0];
    assert!(baseline_top.database_match.is_none());
    assert!(top.merged_confidence > baseline_top.merged_confidence);
}

#[tokio::test]
async fn test_correction_moves_trust_toward_the_agreeing_backend() {
    let service = service_with(apple_pool(), InMemoryFoodDatabase::seeded());
    let cancel = CancellationToken::new();
    let handles = spawn_background(&service, &MealwiseConfig::default(), cancel.clone());

    let user_id = Uuid::new_v4();
    let result = service.recognize(photo(user_id)).await.unwrap();
    let region = &result.regions[0];
    assert_eq!(region.state, RegionState::AwaitingUser);

    let resolution = service
        .resolve_region(ResolveRegionInput {
            region_id: region.id,
            choice: Some(UserChoice::Edit {
                food_name: "apple".to_string(),
                calories: 95.0,
            }),
        })
        .await
        .unwrap();
    assert_eq!(
        resolution.record.as_ref().unwrap().provenance,
        Provenance::OcrCorrected
    );
    assert!(resolution.correction_id.is_some());

    let svc = &service;
    wait_for(|| async move { svc.optimizer.snapshot().await.applied_corrections == 1 }).await;
    let snapshot = service.optimizer.snapshot().await;
    let a = snapshot.trust.get(&BackendId::new("ocr-a"));
    let b = snapshot.trust.get(&BackendId::new("ocr-b"));
    assert!(a > 1.0 && a <= 2.0);
    assert!(b < 1.0 && b >= 0.1);

    // terminal regions cannot be resolved twice
    let again = service
        .resolve_region(ResolveRegionInput {
            region_id: region.id,
            choice: None,
        })
        .await;
    assert!(matches!(again, Err(CoreError::RegionAlreadyResolved(_))));

    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_corrected_value_is_remembered_for_the_next_photo() {
    let service = service_with(apple_pool(), InMemoryFoodDatabase::seeded());
    let cancel = CancellationToken::new();
    let handles = spawn_background(&service, &MealwiseConfig::default(), cancel.clone());
    let user_id = Uuid::new_v4();

    let first = service.recognize(photo(user_id)).await.unwrap();
    service
        .resolve_region(ResolveRegionInput {
            region_id: first.regions[0].id,
            choice: Some(UserChoice::Edit {
                food_name: "apple".to_string(),
                calories: 95.0,
            }),
        })
        .await
        .unwrap();
    let svc = &service;
    wait_for(|| async move { !svc.optimizer.remembered_values(user_id).await.is_empty() }).await;

    let second = service.recognize(photo(user_id)).await.unwrap();
    assert_eq!(second.regions[0].state, RegionState::Accepted);
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].calories, 95.0);

    // other users still see the reference value
    let stranger = service.recognize(photo(Uuid::new_v4())).await.unwrap();
    assert_eq!(stranger.regions[0].candidates[0].calories, 52.0);

    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_persisted_model_is_served_after_restart() {
    let models = InMemoryPreferenceModelRepository::new();
    let user_id = Uuid::new_v4();
    models
        .save(PreferenceModel {
            user_id,
            version: 4,
            kind: TrainingKind::Full,
            feature_weights: BTreeMap::from([("rice".to_string(), 1.0)]),
            idf: BTreeMap::new(),
            trained_on: 20,
            trained_at: Utc::now(),
        })
        .await
        .unwrap();

    let service = service_with_models(apple_pool(), InMemoryFoodDatabase::seeded(), models);
    assert_eq!(service.current_model(user_id).await.unwrap().version, 4);
    assert_eq!(service.model_versions(user_id).await.unwrap(), vec![4]);
}

#[tokio::test]
async fn test_failed_backends_leave_an_empty_awaiting_region() {
    let pool = RecognitionBackendPool::new(Duration::from_secs(2)).with_backend(Arc::new(Broken));
    let service = service_with(pool, InMemoryFoodDatabase::seeded());
    let user_id = Uuid::new_v4();

    let result = service.recognize(photo(user_id)).await.unwrap();
    assert!(matches!(result.backends[0].status, BackendStatus::Failed { .. }));
    assert_eq!(result.regions.len(), 1);
    assert_eq!(result.regions[0].state, RegionState::AwaitingUser);
    assert!(result.regions[0].candidates.is_empty());

    let pending = service.pending_regions(user_id).await.unwrap();
    assert_eq!(pending.len(), 1);

    let resolution = service
        .resolve_region(ResolveRegionInput {
            region_id: pending[0].id,
            choice: Some(UserChoice::Edit {
                food_name: "rice".to_string(),
                calories: 130.0,
            }),
        })
        .await
        .unwrap();
    assert_eq!(resolution.record.unwrap().provenance, Provenance::Manual);
    assert!(service.pending_regions(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_three_days_of_history_gets_the_default_tier() {
    let service = service_with(apple_pool(), InMemoryFoodDatabase::seeded());
    let user_id = Uuid::new_v4();
    record_history(&service, user_id, 3, &["rice", "egg", "tomato", "noodles"]).await;

    let recommendation = service
        .recommend(RecommendInput {
            user_id,
            day: Utc::now().date_naive(),
            slot: None,
        })
        .await
        .unwrap();

    assert_eq!(recommendation.tier, RecommendationTier::Default);
    assert!(recommendation.model_version.is_none());
    assert!(!recommendation.items.is_empty());
    assert!(recommendation.items.iter().all(|item| {
        !item.rationale.contains(&RationaleTag::CyclePhaseSupport)
            && !item.rationale.contains(&RationaleTag::PersonalityMatch)
    }));
}

#[tokio::test]
async fn test_disliked_food_is_never_recommended() {
    let service = service_with(apple_pool(), InMemoryFoodDatabase::seeded());
    let cancel = CancellationToken::new();
    let handles = spawn_background(&service, &MealwiseConfig::default(), cancel.clone());

    let user_id = Uuid::new_v4();
    record_history(&service, user_id, 7, &["fried chicken", "fried chicken", "rice"]).await;
    let svc = &service;
    wait_for(|| async move { svc.models.current(user_id).await.is_some() }).await;

    service
        .record_feedback(RecordFeedbackInput {
            user_id,
            food_name: "Fried Chicken".to_string(),
            reaction: Reaction::Dislike,
        })
        .await
        .unwrap();

    let input = RecommendInput {
        user_id,
        day: Utc::now().date_naive(),
        slot: None,
    };
    let first = service.recommend(input.clone()).await.unwrap();
    assert_eq!(first.tier, RecommendationTier::Personalized);
    for _ in 0..5 {
        let recommendation = service.recommend(input.clone()).await.unwrap();
        assert!(
            recommendation
                .items
                .iter()
                .all(|item| item.food_name.to_lowercase() != "fried chicken")
        );
    }

    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_advisory_degrades_when_the_llm_is_down() {
    let service = service_with(apple_pool(), InMemoryFoodDatabase::seeded());
    let user_id = Uuid::new_v4();
    let day = Utc::now().date_naive();
    service
        .record_meal(RecordMealInput {
            user_id,
            eaten_at: None,
            slot: MealSlot::Breakfast,
            food_name: "oatmeal".to_string(),
            calories: 150.0,
        })
        .await
        .unwrap();

    let report = service
        .daily_advisory(DailyAdvisoryInput { user_id, day })
        .await
        .unwrap();
    assert_eq!(report.summary.record_count, 1);
    assert!(matches!(report.advisory, AdvisoryStatus::Unavailable { .. }));
}
