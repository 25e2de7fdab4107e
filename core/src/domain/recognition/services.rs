use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    advisory::ports::LLMClient,
    common::{
        entities::app_errors::CoreError, generate_timestamp, generate_uuid_v7, services::Service,
    },
    events::MealwiseEvent,
    feedback::ports::FeedbackRepository,
    food::{helpers::normalize_food_name, ports::FoodReferenceDatabase},
    learning::ports::CorrectionRepository,
    meal::{entities::MealRecord, ports::MealRecordRepository},
    preference::ports::PreferenceModelRepository,
    profile::ports::UserProfileRepository,
    recognition::{
        entities::{BackendId, BackendStatus, ImageInput, MergedRegion, RegionLocator},
        merger::MergeContext,
        ports::RecognitionService,
        value_objects::{
            BackendSummary, RecognitionResult, RecognizeInput, RegionResolution,
            ResolveRegionInput,
        },
    },
    validation::entities::{GateOutcome, Region, RegionConfig, Resolution},
};

impl<M, F, P, CA, PM, D, LLM> Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    /// Stores an accepted record and announces it.
    pub(crate) async fn store_record(&self, record: MealRecord) -> Result<MealRecord, CoreError> {
        let record = self.meal_repository.append(record).await?;
        self.announce_record(&record);
        Ok(record)
    }

    fn announce_record(&self, record: &MealRecord) {
        self.event_bus.publish(MealwiseEvent::MealRecorded {
            record: record.clone(),
        });
    }
}

impl<M, F, P, CA, PM, D, LLM> RecognitionService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    #[instrument(skip(self, input), fields(user_id = %input.user_id, slot = input.slot.as_str()))]
    async fn recognize(&self, input: RecognizeInput) -> Result<RecognitionResult, CoreError> {
        if input.image.is_empty() {
            return Err(CoreError::InvalidInput("image is empty".to_string()));
        }

        let request_id = generate_uuid_v7();
        let (now, _) = generate_timestamp();
        let eaten_at = input.eaten_at.unwrap_or(now);

        // 1. Fan out to every backend
        let image = Arc::new(ImageInput::new(input.image));
        let outputs = self.pool.recognize(image).await;

        for output in &outputs {
            let reason = match &output.status {
                BackendStatus::Ok => continue,
                BackendStatus::Failed { reason } => reason.clone(),
                BackendStatus::TimedOut => "timed out".to_string(),
            };
            self.event_bus.publish(MealwiseEvent::BackendFailed {
                request_id,
                backend: output.backend.clone(),
                reason,
                timestamp: now,
            });
        }

        // 2. Normalize raw text into (name, calories) pairs
        let report = self.normalizer.normalize(&outputs);

        // 3. Resolve reference entries; an unavailable database only means no match
        let names: BTreeSet<String> = report
            .candidates
            .iter()
            .filter_map(|c| c.food_name.as_deref())
            .map(normalize_food_name)
            .collect();
        let mut references = HashMap::new();
        for name in names {
            match self.food_database.lookup(name.clone()).await {
                Ok(Some(reference)) => {
                    references.insert(name, reference);
                }
                Ok(None) => {}
                Err(e) => warn!(name = %name, "food database lookup failed: {}", e),
            }
        }

        // 4. Merge with the current learned weights and the user's own corrections
        let snapshot = self.optimizer.snapshot().await;
        let remembered = self.optimizer.remembered_values(input.user_id).await;
        let answered: Vec<BackendId> = outputs
            .iter()
            .filter(|o| o.answered())
            .map(|o| o.backend.clone())
            .collect();
        let ctx = MergeContext {
            trust: &snapshot.trust,
            rules: &snapshot.rules,
            answered: &answered,
            references: &references,
            remembered: &remembered,
        };
        let mut merged = self.merger.merge(&report.candidates, &ctx);
        if merged.is_empty() {
            merged.push(MergedRegion {
                locator: RegionLocator::whole_image(),
                candidates: Vec::new(),
                proposals: Vec::new(),
            });
        }

        // 5. Gate every region
        let mut regions = Vec::with_capacity(merged.len());
        let mut records = Vec::new();
        for merged_region in merged {
            let mut region = Region::new(
                RegionConfig {
                    request_id,
                    user_id: input.user_id,
                    slot: input.slot,
                    eaten_at,
                },
                merged_region,
            );

            let pending = region.clone();
            match self.gate.evaluate(&mut region)? {
                GateOutcome::Accepted(record) => match self.store_record(record).await {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(region_id = %region.id, "accepted record not stored, asking the user: {}", e);
                        region = pending;
                        self.gate.defer(&mut region);
                    }
                },
                GateOutcome::Rejected { reason } => {
                    self.event_bus.publish(MealwiseEvent::RegionRejected {
                        region_id: region.id,
                        user_id: region.user_id,
                        reason,
                        timestamp: now,
                    });
                }
                GateOutcome::AwaitingUser => {}
            }

            self.regions.insert(region.clone()).await;
            regions.push(region);
        }

        info!(
            %request_id,
            regions = regions.len(),
            accepted = records.len(),
            dropped = report.dropped,
            "recognition completed"
        );
        self.event_bus.publish(MealwiseEvent::RecognitionCompleted {
            request_id,
            user_id: input.user_id,
            region_ids: regions.iter().map(|r| r.id).collect(),
            dropped_fragments: report.dropped,
            timestamp: now,
        });

        Ok(RecognitionResult {
            request_id,
            regions,
            records,
            backends: outputs
                .into_iter()
                .map(|o| BackendSummary {
                    backend: o.backend,
                    status: o.status,
                    candidates: o.candidates.len(),
                    elapsed_ms: o.elapsed_ms,
                })
                .collect(),
            dropped_fragments: report.dropped,
        })
    }

    #[instrument(skip(self, input), fields(region_id = %input.region_id))]
    async fn resolve_region(
        &self,
        input: ResolveRegionInput,
    ) -> Result<RegionResolution, CoreError> {
        let gate = Arc::clone(&self.gate);
        let choice = input.choice;
        let (resolution, region) = self
            .regions
            .transition(
                input.region_id,
                move |region| gate.resolve(region, choice),
                |resolution| async move {
                    match resolution {
                        Resolution::Accepted { record, correction } => {
                            let record = self.meal_repository.append(record).await?;
                            Ok::<_, CoreError>(Resolution::Accepted { record, correction })
                        }
                        Resolution::Rejected => Ok(Resolution::Rejected),
                    }
                },
            )
            .await?;

        match resolution {
            Resolution::Rejected => {
                self.event_bus.publish(MealwiseEvent::RegionRejected {
                    region_id: region.id,
                    user_id: region.user_id,
                    reason: "rejected by user".to_string(),
                    timestamp: generate_timestamp().0,
                });
                Ok(RegionResolution {
                    region,
                    record: None,
                    correction_id: None,
                })
            }
            Resolution::Accepted { record, correction } => {
                self.announce_record(&record);
                let correction_id = correction.as_ref().map(|c| c.id);
                if let Some(correction) = correction {
                    self.event_bus
                        .publish(MealwiseEvent::CorrectionSubmitted { correction });
                }
                Ok(RegionResolution {
                    region,
                    record: Some(record),
                    correction_id,
                })
            }
        }
    }

    async fn pending_regions(&self, user_id: Uuid) -> Result<Vec<Region>, CoreError> {
        Ok(self.regions.awaiting_for_user(user_id).await)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use bytes::Bytes;
    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        domain::{
            advisory::ports::MockLLMClient,
            common::{MealwiseConfig, services::ServiceDependencies},
            events::EventKind,
            meal::{entities::MealSlot, ports::MockMealRecordRepository},
            recognition::{
                entities::{ImageInput, RecognitionCandidate},
                pool::RecognitionBackendPool,
                ports::Recognizer,
            },
            validation::entities::{RegionState, UserChoice},
        },
        infrastructure::{
            feedback::InMemoryFeedbackRepository, food::InMemoryFoodDatabase,
            learning::InMemoryCorrectionRepository,
            preference::InMemoryPreferenceModelRepository, profile::InMemoryProfileRepository,
        },
    };

    struct SureLabel;

    impl Recognizer for SureLabel {
        fn id(&self) -> BackendId {
            BackendId::new("sure")
        }

        fn recognize<'a>(
            &'a self,
            _image: &'a ImageInput,
        ) -> BoxFuture<'a, Result<Vec<RecognitionCandidate>, CoreError>> {
            Box::pin(async move {
                Ok(vec![RecognitionCandidate::raw(
                    self.id(),
                    "apple 52 kcal",
                    RegionLocator::whole_image(),
                    1.0,
                )])
            })
        }
    }

    /// Mocked meal storage whose first append fails.
    #[derive(Clone)]
    struct FlakyMeals(Arc<MockMealRecordRepository>);

    impl FlakyMeals {
        fn new() -> Self {
            let fail_next = AtomicBool::new(true);
            let mut mock = MockMealRecordRepository::new();
            mock.expect_append().returning(move |record| {
                let fail = fail_next.swap(false, Ordering::SeqCst);
                Box::pin(async move {
                    if fail {
                        Err(CoreError::ExternalServiceError("disk full".to_string()))
                    } else {
                        Ok(record)
                    }
                })
            });
            mock.expect_list_by_user()
                .returning(|_| Box::pin(async { Ok(Vec::new()) }));
            Self(Arc::new(mock))
        }
    }

    impl MealRecordRepository for FlakyMeals {
        async fn append(&self, record: MealRecord) -> Result<MealRecord, CoreError> {
            self.0.append(record).await
        }

        async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<MealRecord>, CoreError> {
            self.0.list_by_user(user_id).await
        }
    }

    type FlakyService = Service<
        FlakyMeals,
        InMemoryFeedbackRepository,
        InMemoryProfileRepository,
        InMemoryCorrectionRepository,
        InMemoryPreferenceModelRepository,
        InMemoryFoodDatabase,
        MockLLMClient,
    >;

    fn service(pool: RecognitionBackendPool) -> FlakyService {
        Service::new(
            &MealwiseConfig::default(),
            ServiceDependencies {
                meal_repository: FlakyMeals::new(),
                feedback_repository: InMemoryFeedbackRepository::new(),
                profile_repository: InMemoryProfileRepository::new(),
                correction_repository: InMemoryCorrectionRepository::new(),
                model_repository: InMemoryPreferenceModelRepository::new(),
                food_database: InMemoryFoodDatabase::seeded(),
                llm_client: MockLLMClient::new(),
                pool,
            },
        )
        .unwrap()
    }

    fn photo(user_id: Uuid) -> RecognizeInput {
        RecognizeInput {
            user_id,
            slot: MealSlot::Snack,
            eaten_at: None,
            image: Bytes::from_static(b"\x89PNG apple label"),
        }
    }

    #[tokio::test]
    async fn test_unstored_auto_accept_falls_back_to_the_user() {
        let pool = RecognitionBackendPool::new(Duration::from_secs(2))
            .with_backend(Arc::new(SureLabel));
        let service = service(pool);
        let mut completed = service
            .event_bus
            .subscribe(&[EventKind::RecognitionCompleted]);
        let user_id = Uuid::new_v4();

        let result = service.recognize(photo(user_id)).await.unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.regions[0].state, RegionState::AwaitingUser);
        assert_eq!(result.regions[0].candidates[0].calories, 52.0);
        assert!(matches!(
            completed.try_recv(),
            Ok(MealwiseEvent::RecognitionCompleted { .. })
        ));

        let pending = service.pending_regions(user_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        let resolution = service
            .resolve_region(ResolveRegionInput {
                region_id: pending[0].id,
                choice: Some(UserChoice::Confirm { rank: 0 }),
            })
            .await
            .unwrap();
        assert_eq!(resolution.record.unwrap().calories, 52.0);
    }

    #[tokio::test]
    async fn test_failed_append_leaves_the_region_resolvable() {
        let service = service(RecognitionBackendPool::new(Duration::from_secs(2)));
        let mut recorded = service.event_bus.subscribe(&[EventKind::MealRecorded]);
        let user_id = Uuid::new_v4();
        let result = service.recognize(photo(user_id)).await.unwrap();
        let region_id = result.regions[0].id;
        let edit = || ResolveRegionInput {
            region_id,
            choice: Some(UserChoice::Edit {
                food_name: "rice".to_string(),
                calories: 130.0,
            }),
        };

        let failed = service.resolve_region(edit()).await;
        assert!(matches!(failed, Err(CoreError::ExternalServiceError(_))));
        assert_eq!(service.pending_regions(user_id).await.unwrap().len(), 1);
        assert!(recorded.try_recv().is_err());

        let resolution = service.resolve_region(edit()).await.unwrap();
        assert_eq!(resolution.region.state, RegionState::Accepted);
        assert!(service.pending_regions(user_id).await.unwrap().is_empty());
        assert!(matches!(
            recorded.try_recv(),
            Ok(MealwiseEvent::MealRecorded { .. })
        ));
    }
}
