use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc::UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    common::{LearningConfig, entities::app_errors::CoreError},
    events::MealwiseEvent,
    food::helpers::{calories_agree, normalize_food_name},
    learning::{
        entities::{ApplyOutcome, LearningSnapshot, RememberedValue, RuleWeights, TrustWeights},
        ports::CorrectionRepository,
    },
    validation::entities::Correction,
};

#[derive(Debug, Default)]
struct LearningState {
    trust: TrustWeights,
    rules: RuleWeights,
    applied_total: usize,
    applied: HashMap<Uuid, Instant>,
    corrected_regions: HashMap<Uuid, (Uuid, Instant)>,
    updated_at: Option<DateTime<Utc>>,
}

impl LearningState {
    fn forget_older_than(&mut self, retention: std::time::Duration) {
        self.applied.retain(|_, seen| seen.elapsed() <= retention);
        self.corrected_regions
            .retain(|_, (_, seen)| seen.elapsed() <= retention);
    }
}

/// Adjusts backend trust-weights and merge-rule weights from user corrections.
///
/// Every update is a bounded step `w + alpha * (target - w)` clamped to the configured
/// range, keyed by correction id: a redelivered event changes nothing.
pub struct RecognitionLearningOptimizer<CA: CorrectionRepository> {
    config: LearningConfig,
    calorie_tolerance: f64,
    state: RwLock<LearningState>,
    archive: CA,
}

impl<CA: CorrectionRepository> RecognitionLearningOptimizer<CA> {
    pub fn new(config: LearningConfig, calorie_tolerance: f64, archive: CA) -> Self {
        Self {
            config,
            calorie_tolerance,
            state: RwLock::new(LearningState::default()),
            archive,
        }
    }

    pub async fn snapshot(&self) -> LearningSnapshot {
        let state = self.state.read().await;
        LearningSnapshot {
            trust: state.trust.clone(),
            rules: state.rules,
            applied_corrections: state.applied_total,
            updated_at: state.updated_at,
        }
    }

    #[instrument(skip(self, correction), fields(correction_id = %correction.id, region_id = %correction.region_id))]
    pub async fn apply(&self, correction: &Correction) -> Result<ApplyOutcome, CoreError> {
        let mut state = self.state.write().await;
        state.forget_older_than(self.config.dedup_retention);

        if state.applied.contains_key(&correction.id) {
            debug!("correction already applied");
            return Ok(ApplyOutcome::Duplicate);
        }

        if let Some((existing, _)) = state.corrected_regions.get(&correction.region_id) {
            warn!(existing_correction = %existing, "region already corrected, ignoring");
            return Err(CoreError::CorrectionRejected(format!(
                "region {} was already corrected by {}",
                correction.region_id, existing
            )));
        }

        let accepted_name = normalize_food_name(&correction.accepted_name);
        for proposal in &correction.proposals {
            let matched = normalize_food_name(&proposal.food_name) == accepted_name
                && calories_agree(
                    proposal.calories,
                    correction.accepted_calories,
                    self.calorie_tolerance,
                );
            let target = if matched {
                self.config.w_max
            } else {
                self.config.w_min
            };
            let current = state.trust.get(&proposal.backend);
            let next = self.step(current, target, self.config.w_min, self.config.w_max);
            debug!(backend = %proposal.backend, matched, from = current, to = next, "trust weight update");
            state.trust.set(proposal.backend.clone(), next);
        }

        if let Some(database_match) = &correction.original.database_match {
            let helped = calories_agree(
                database_match.canonical_calories,
                correction.accepted_calories,
                self.calorie_tolerance,
            );
            let target = if helped {
                self.config.rule_max
            } else {
                self.config.rule_min
            };
            state.rules.database_bonus = self.step(
                state.rules.database_bonus,
                target,
                self.config.rule_min,
                self.config.rule_max,
            );
        }

        if correction.original.calorie_variance > 0.0 {
            let top_value_held = calories_agree(
                correction.original.calories,
                correction.accepted_calories,
                self.calorie_tolerance,
            );
            let another_backend_had_it = correction.proposals.iter().any(|p| {
                calories_agree(p.calories, correction.accepted_calories, self.calorie_tolerance)
            });
            // penalty suppressed a right value: soften; disagreement flagged a wrong one: sharpen
            let target = if top_value_held {
                Some(self.config.rule_min)
            } else if another_backend_had_it {
                Some(self.config.rule_max)
            } else {
                None
            };
            if let Some(target) = target {
                state.rules.variance_penalty = self.step(
                    state.rules.variance_penalty,
                    target,
                    self.config.rule_min,
                    self.config.rule_max,
                );
            }
        }

        let seen = Instant::now();
        state.applied_total += 1;
        state.applied.insert(correction.id, seen);
        state
            .corrected_regions
            .insert(correction.region_id, (correction.id, seen));
        state.updated_at = Some(Utc::now());
        drop(state);

        if let Err(e) = self.archive.archive(correction.clone()).await {
            error!("Failed to archive correction: {}", e);
        }

        info!("correction applied");
        Ok(ApplyOutcome::Applied)
    }

    /// Latest accepted value per food from the user's archived corrections, keyed by
    /// normalized accepted name.
    pub async fn remembered_values(&self, user_id: Uuid) -> HashMap<String, RememberedValue> {
        let mut corrections = match self.archive.list_by_user(user_id).await {
            Ok(corrections) => corrections,
            Err(e) => {
                warn!(%user_id, "correction history unavailable: {}", e);
                return HashMap::new();
            }
        };
        corrections.sort_by_key(|c| c.created_at);

        corrections
            .into_iter()
            .map(|correction| {
                (
                    normalize_food_name(&correction.accepted_name),
                    RememberedValue {
                        food_name: correction.accepted_name,
                        calories: correction.accepted_calories,
                    },
                )
            })
            .collect()
    }

    fn step(&self, current: f64, target: f64, min: f64, max: f64) -> f64 {
        (current + self.config.alpha * (target - current)).clamp(min, max)
    }

    /// Consumes `CorrectionSubmitted` events until cancelled or the bus goes away.
    pub async fn run(
        self: Arc<Self>,
        mut events: UnboundedReceiver<MealwiseEvent>,
        cancel: CancellationToken,
    ) {
        info!("recognition learning optimizer started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(MealwiseEvent::CorrectionSubmitted { correction }) => {
                        if let Err(e) = self.apply(&correction).await {
                            warn!(correction_id = %correction.id, "correction ignored: {}", e);
                        }
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }
        info!("recognition learning optimizer stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{
        learning::ports::MockCorrectionRepository,
        recognition::entities::{BackendId, BackendProposal, DatabaseMatch, MergedCandidate},
        validation::entities::CorrectionConfig,
    };

    #[derive(Default)]
    struct RecordingArchive {
        archived: Mutex<Vec<Uuid>>,
    }

    impl CorrectionRepository for RecordingArchive {
        async fn archive(&self, correction: Correction) -> Result<Correction, CoreError> {
            self.archived.lock().unwrap().push(correction.id);
            Ok(correction)
        }

        async fn list_by_user(&self, _user_id: Uuid) -> Result<Vec<Correction>, CoreError> {
            Ok(Vec::new())
        }
    }

    fn proposal(backend: &str, name: &str, calories: f64) -> BackendProposal {
        BackendProposal {
            backend: BackendId::new(backend),
            food_name: name.to_string(),
            calories,
            confidence: 0.8,
        }
    }

    fn correction(region_id: Uuid) -> Correction {
        Correction::new(CorrectionConfig {
            region_id,
            user_id: Uuid::new_v4(),
            original: MergedCandidate {
                food_name: "apple".to_string(),
                calories: 95.0,
                merged_confidence: 0.6,
                contributing: Vec::new(),
                database_match: Some(DatabaseMatch {
                    reference_id: "apple".to_string(),
                    canonical_name: "apple".to_string(),
                    canonical_calories: 52.0,
                    agrees: false,
                }),
                calorie_variance: 462.25,
                user_confirmed: false,
            },
            proposals: vec![proposal("a", "apple", 95.0), proposal("b", "apple", 52.0)],
            accepted_name: "apple".to_string(),
            accepted_calories: 52.0,
        })
    }

    fn optimizer() -> RecognitionLearningOptimizer<RecordingArchive> {
        RecognitionLearningOptimizer::new(
            LearningConfig::default(),
            0.1,
            RecordingArchive::default(),
        )
    }

    #[tokio::test]
    async fn test_matching_backend_gains_and_other_loses() {
        let optimizer = optimizer();
        optimizer.apply(&correction(Uuid::new_v4())).await.unwrap();

        let snapshot = optimizer.snapshot().await;
        assert!(snapshot.trust.get(&BackendId::new("b")) > 1.0);
        assert!(snapshot.trust.get(&BackendId::new("a")) < 1.0);
        assert!(snapshot.rules.database_bonus > 1.0);
        assert!(snapshot.rules.variance_penalty > 1.0);
        assert_eq!(optimizer.archive.archived.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replaying_a_correction_is_idempotent() {
        let optimizer = optimizer();
        let c = correction(Uuid::new_v4());

        assert_eq!(optimizer.apply(&c).await.unwrap(), ApplyOutcome::Applied);
        let once = optimizer.snapshot().await;
        assert_eq!(optimizer.apply(&c).await.unwrap(), ApplyOutcome::Duplicate);
        let twice = optimizer.snapshot().await;

        assert_eq!(once.trust, twice.trust);
        assert_eq!(once.rules, twice.rules);
        assert_eq!(optimizer.archive.archived.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_correction_for_same_region_is_rejected() {
        let optimizer = optimizer();
        let region = Uuid::new_v4();
        optimizer.apply(&correction(region)).await.unwrap();

        let result = optimizer.apply(&correction(region)).await;
        assert!(matches!(result, Err(CoreError::CorrectionRejected(_))));
    }

    #[tokio::test]
    async fn test_weights_stay_within_bounds() {
        let optimizer = optimizer();
        let config = LearningConfig::default();
        for _ in 0..200 {
            optimizer.apply(&correction(Uuid::new_v4())).await.unwrap();
        }

        let snapshot = optimizer.snapshot().await;
        for weight in snapshot.trust.weights.values() {
            assert!(*weight >= config.w_min && *weight <= config.w_max);
        }
        assert!(snapshot.rules.database_bonus <= config.rule_max);
        assert!(snapshot.rules.variance_penalty <= config.rule_max);
    }

    #[tokio::test]
    async fn test_variance_penalty_softens_when_the_top_value_was_right() {
        let optimizer = optimizer();
        let mut c = correction(Uuid::new_v4());
        // name fixed, calories kept
        c.accepted_name = "green apple".to_string();
        c.accepted_calories = 95.0;
        optimizer.apply(&c).await.unwrap();

        assert!(optimizer.snapshot().await.rules.variance_penalty < 1.0);
    }

    #[tokio::test]
    async fn test_variance_penalty_moves_both_ways() {
        let optimizer = optimizer();
        optimizer.apply(&correction(Uuid::new_v4())).await.unwrap();
        let sharpened = optimizer.snapshot().await.rules.variance_penalty;

        let mut c = correction(Uuid::new_v4());
        c.accepted_calories = 95.0;
        optimizer.apply(&c).await.unwrap();
        let softened = optimizer.snapshot().await.rules.variance_penalty;

        assert!(sharpened > 1.0);
        assert!(softened < sharpened);
    }

    #[tokio::test]
    async fn test_value_nobody_proposed_leaves_variance_penalty() {
        let optimizer = optimizer();
        let mut c = correction(Uuid::new_v4());
        c.accepted_calories = 300.0;
        optimizer.apply(&c).await.unwrap();

        assert_eq!(optimizer.snapshot().await.rules.variance_penalty, 1.0);
    }

    #[tokio::test]
    async fn test_dedup_state_is_pruned_after_retention() {
        let optimizer = RecognitionLearningOptimizer::new(
            LearningConfig {
                dedup_retention: std::time::Duration::from_millis(20),
                ..LearningConfig::default()
            },
            0.1,
            RecordingArchive::default(),
        );
        for _ in 0..3 {
            optimizer.apply(&correction(Uuid::new_v4())).await.unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        optimizer.apply(&correction(Uuid::new_v4())).await.unwrap();

        let state = optimizer.state.read().await;
        assert_eq!(state.applied.len(), 1);
        assert_eq!(state.corrected_regions.len(), 1);
        drop(state);
        assert_eq!(optimizer.snapshot().await.applied_corrections, 4);
    }

    #[tokio::test]
    async fn test_remembered_values_keep_the_latest_correction() {
        let user_id = Uuid::new_v4();
        let mut earlier = correction(Uuid::new_v4());
        earlier.user_id = user_id;
        earlier.accepted_calories = 80.0;
        earlier.created_at = Utc::now() - chrono::Duration::hours(1);
        let mut latest = correction(Uuid::new_v4());
        latest.user_id = user_id;
        latest.accepted_name = "Apple".to_string();
        latest.accepted_calories = 60.0;

        let mut archive = MockCorrectionRepository::new();
        archive
            .expect_list_by_user()
            .returning(move |_| {
                let corrections = vec![latest.clone(), earlier.clone()];
                Box::pin(async move { Ok(corrections) })
            });
        let optimizer = RecognitionLearningOptimizer::new(LearningConfig::default(), 0.1, archive);

        let remembered = optimizer.remembered_values(user_id).await;
        assert_eq!(remembered.len(), 1);
        assert_eq!(remembered["apple"].calories, 60.0);
    }

    #[tokio::test]
    async fn test_worker_consumes_events_until_cancelled() {
        let optimizer = Arc::new(optimizer());
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(Arc::clone(&optimizer).run(rx, cancel.clone()));

        let c = correction(Uuid::new_v4());
        tx.send(MealwiseEvent::CorrectionSubmitted {
            correction: c.clone(),
        })
        .unwrap();
        tx.send(MealwiseEvent::CorrectionSubmitted { correction: c })
            .unwrap();
        drop(tx);

        worker.await.unwrap();
        cancel.cancel();
        assert_eq!(optimizer.snapshot().await.applied_corrections, 1);
    }
}
