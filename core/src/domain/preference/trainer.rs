use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, mpsc::UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    common::{PreferenceConfig, entities::app_errors::CoreError, generate_timestamp},
    events::{EventBus, MealwiseEvent},
    feedback::{entities::Feedback, ports::FeedbackRepository},
    meal::{entities::MealRecord, ports::MealRecordRepository},
    preference::{
        entities::{PreferenceModel, TrainingKind},
        ports::PreferenceModelRepository,
        statistics::PreferenceStatistics,
        store::ModelStore,
    },
};

/// Keeps per-user statistics current and publishes a new model after every change.
pub struct PreferenceTrainer<M, F, PM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    PM: PreferenceModelRepository,
{
    config: PreferenceConfig,
    statistics: Mutex<HashMap<Uuid, PreferenceStatistics>>,
    store: Arc<ModelStore>,
    event_bus: Arc<EventBus>,
    meal_repository: M,
    feedback_repository: F,
    model_repository: PM,
}

impl<M, F, PM> PreferenceTrainer<M, F, PM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    PM: PreferenceModelRepository,
{
    pub fn new(
        config: PreferenceConfig,
        store: Arc<ModelStore>,
        event_bus: Arc<EventBus>,
        meal_repository: M,
        feedback_repository: F,
        model_repository: PM,
    ) -> Self {
        Self {
            config,
            statistics: Mutex::new(HashMap::new()),
            store,
            event_bus,
            meal_repository,
            feedback_repository,
            model_repository,
        }
    }

    pub fn store(&self) -> Arc<ModelStore> {
        Arc::clone(&self.store)
    }

    /// Loads the user's persisted versions into the store the first time the user is seen.
    pub async fn load_persisted(&self, user_id: Uuid) {
        if self.store.knows(user_id).await {
            return;
        }
        match self.model_repository.list_by_user(user_id).await {
            Ok(models) => {
                let restored = self.store.restore(user_id, models).await;
                if restored > 0 {
                    info!(%user_id, restored, "persisted preference models restored");
                }
            }
            Err(e) => warn!(%user_id, "persisted preference models unavailable: {}", e),
        }
    }

    #[instrument(skip(self, record), fields(user_id = %record.user_id, record_id = %record.id))]
    pub async fn on_record(
        &self,
        record: &MealRecord,
    ) -> Result<Option<Arc<PreferenceModel>>, CoreError> {
        let mut statistics = self.statistics.lock().await;
        let half_life = self.config.recency_half_life_days;

        let kind = match statistics.get_mut(&record.user_id) {
            Some(stats) => {
                if !stats.ingest_record(record, half_life) {
                    debug!("meal record already ingested");
                    return Ok(None);
                }
                self.next_kind(stats)
            }
            None => TrainingKind::Full,
        };

        self.train_locked(&mut statistics, record.user_id, kind)
            .await
            .map(Some)
    }

    #[instrument(skip(self, feedback), fields(user_id = %feedback.user_id, feedback_id = %feedback.id))]
    pub async fn on_feedback(
        &self,
        feedback: &Feedback,
    ) -> Result<Option<Arc<PreferenceModel>>, CoreError> {
        let mut statistics = self.statistics.lock().await;
        let half_life = self.config.recency_half_life_days;

        let kind = match statistics.get_mut(&feedback.user_id) {
            Some(stats) => {
                if !stats.ingest_feedback(feedback, half_life) {
                    debug!("feedback already ingested");
                    return Ok(None);
                }
                self.next_kind(stats)
            }
            None => TrainingKind::Full,
        };

        self.train_locked(&mut statistics, feedback.user_id, kind)
            .await
            .map(Some)
    }

    /// Rebuilds the user's statistics from stored history and publishes a fresh model.
    pub async fn retrain_full(&self, user_id: Uuid) -> Result<Arc<PreferenceModel>, CoreError> {
        let mut statistics = self.statistics.lock().await;
        self.train_locked(&mut statistics, user_id, TrainingKind::Full)
            .await
    }

    fn next_kind(&self, stats: &PreferenceStatistics) -> TrainingKind {
        if stats.deltas_since_full >= self.config.full_retrain_threshold {
            TrainingKind::Full
        } else {
            TrainingKind::Incremental
        }
    }

    async fn train_locked(
        &self,
        statistics: &mut HashMap<Uuid, PreferenceStatistics>,
        user_id: Uuid,
        kind: TrainingKind,
    ) -> Result<Arc<PreferenceModel>, CoreError> {
        if kind == TrainingKind::Full {
            let records = self.meal_repository.list_by_user(user_id).await?;
            let feedback = self.feedback_repository.list_by_user(user_id).await?;
            let rebuilt = PreferenceStatistics::rebuild(
                user_id,
                &records,
                &feedback,
                self.config.recency_half_life_days,
            );
            statistics.insert(user_id, rebuilt);
        }

        let stats = statistics
            .entry(user_id)
            .or_insert_with(|| PreferenceStatistics::new(user_id));

        let model = match PreferenceModel::train(stats, kind, &self.config) {
            Ok(model) => model,
            Err(e) => {
                if stats.sample_count() < self.config.min_training_samples {
                    debug!("training skipped: {}", e);
                } else {
                    warn!("training failed, keeping last published model: {}", e);
                }
                self.event_bus.publish(MealwiseEvent::TrainingFailed {
                    user_id,
                    reason: e.to_string(),
                    timestamp: generate_timestamp().0,
                });
                return Err(e);
            }
        };

        self.load_persisted(user_id).await;
        let published = self.store.publish(model).await;
        if let Err(e) = self.model_repository.save((*published).clone()).await {
            error!("Failed to persist preference model: {}", e);
        }

        info!(version = published.version, ?kind, "preference model published");
        self.event_bus.publish(MealwiseEvent::ModelPublished {
            user_id,
            version: published.version,
            kind,
            timestamp: published.trained_at,
        });

        Ok(published)
    }

    pub async fn handle(&self, event: &MealwiseEvent) {
        let result = match event {
            MealwiseEvent::MealRecorded { record } => self.on_record(record).await,
            MealwiseEvent::FeedbackRecorded { feedback } => self.on_feedback(feedback).await,
            _ => return,
        };
        if let Err(e) = result {
            debug!("event did not produce a model: {}", e);
        }
    }

    /// Consumes record and feedback events until cancelled or the bus goes away.
    pub async fn run(
        self: Arc<Self>,
        mut events: UnboundedReceiver<MealwiseEvent>,
        cancel: CancellationToken,
    ) {
        info!("preference trainer started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle(&event).await,
                    None => break,
                },
            }
        }
        info!("preference trainer stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::domain::{
        events::EventKind,
        feedback::entities::{FeedbackConfig, Reaction},
        meal::entities::{MealRecordConfig, MealSlot, Provenance},
    };

    #[derive(Clone, Default)]
    struct History {
        records: Arc<StdMutex<Vec<MealRecord>>>,
        feedback: Arc<StdMutex<Vec<Feedback>>>,
        models: Arc<StdMutex<Vec<PreferenceModel>>>,
    }

    impl MealRecordRepository for History {
        async fn append(&self, record: MealRecord) -> Result<MealRecord, CoreError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<MealRecord>, CoreError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().filter(|r| r.user_id == user_id).cloned().collect())
        }
    }

    impl FeedbackRepository for History {
        async fn append(&self, feedback: Feedback) -> Result<Feedback, CoreError> {
            self.feedback.lock().unwrap().push(feedback.clone());
            Ok(feedback)
        }

        async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Feedback>, CoreError> {
            let feedback = self.feedback.lock().unwrap();
            Ok(feedback.iter().filter(|f| f.user_id == user_id).cloned().collect())
        }
    }

    impl PreferenceModelRepository for History {
        async fn save(&self, model: PreferenceModel) -> Result<PreferenceModel, CoreError> {
            self.models.lock().unwrap().push(model.clone());
            Ok(model)
        }

        async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PreferenceModel>, CoreError> {
            let models = self.models.lock().unwrap();
            Ok(models.iter().filter(|m| m.user_id == user_id).cloned().collect())
        }
    }

    fn record(user_id: Uuid, name: &str, days_ago: i64) -> MealRecord {
        MealRecord::new(MealRecordConfig {
            user_id,
            eaten_at: Utc::now() - Duration::days(days_ago),
            slot: MealSlot::Lunch,
            food_name: name.to_string(),
            calories: 200.0,
            provenance: Provenance::Manual,
        })
    }

    fn trainer(
        history: &History,
        bus: Arc<EventBus>,
    ) -> PreferenceTrainer<History, History, History> {
        let config = PreferenceConfig {
            min_training_samples: 3,
            full_retrain_threshold: 4,
            ..PreferenceConfig::default()
        };
        PreferenceTrainer::new(
            config,
            Arc::new(ModelStore::new(5)),
            bus,
            history.clone(),
            history.clone(),
            history.clone(),
        )
    }

    async fn append_and_train(
        history: &History,
        trainer: &PreferenceTrainer<History, History, History>,
        record: MealRecord,
    ) -> Result<Option<Arc<PreferenceModel>>, CoreError> {
        MealRecordRepository::append(history, record.clone()).await?;
        trainer.on_record(&record).await
    }

    #[tokio::test]
    async fn test_insufficient_history_keeps_no_model_and_reports_failure() {
        let history = History::default();
        let bus = Arc::new(EventBus::new());
        let mut failures = bus.subscribe(&[EventKind::TrainingFailed]);
        let trainer = trainer(&history, Arc::clone(&bus));
        let user = Uuid::new_v4();

        let result = append_and_train(&history, &trainer, record(user, "rice", 0)).await;
        assert!(matches!(result, Err(CoreError::TrainingFailed(_))));
        assert!(trainer.store().current(user).await.is_none());
        assert!(matches!(
            failures.try_recv(),
            Ok(MealwiseEvent::TrainingFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_each_record_publishes_a_new_version() {
        let history = History::default();
        let bus = Arc::new(EventBus::new());
        let mut published = bus.subscribe(&[EventKind::ModelPublished]);
        let trainer = trainer(&history, Arc::clone(&bus));
        let user = Uuid::new_v4();

        for (i, name) in ["rice", "noodles", "rice", "porridge"].iter().enumerate() {
            let _ = append_and_train(&history, &trainer, record(user, name, i as i64)).await;
        }

        let current = trainer.store().current(user).await.unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.trained_on, 4);
        assert_eq!(history.models.lock().unwrap().len(), 2);
        assert!(matches!(
            published.try_recv(),
            Ok(MealwiseEvent::ModelPublished { version: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_full_retrain_after_threshold() {
        let history = History::default();
        let bus = Arc::new(EventBus::new());
        let trainer = trainer(&history, bus);
        let user = Uuid::new_v4();

        let mut kinds = Vec::new();
        for i in 0..8 {
            if let Ok(Some(model)) =
                append_and_train(&history, &trainer, record(user, "rice", i)).await
            {
                kinds.push(model.kind);
            }
        }

        assert!(kinds.contains(&TrainingKind::Incremental));
        assert!(kinds.iter().skip(1).any(|k| *k == TrainingKind::Full));
    }

    #[tokio::test]
    async fn test_redelivered_event_is_ignored() {
        let history = History::default();
        let trainer = trainer(&history, Arc::new(EventBus::new()));
        let user = Uuid::new_v4();
        for i in 0..3 {
            let _ = append_and_train(&history, &trainer, record(user, "rice", i)).await;
        }
        let last = history.records.lock().unwrap().last().cloned().unwrap();

        assert!(trainer.on_record(&last).await.unwrap().is_none());
        assert_eq!(trainer.store().current(user).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_persisted_models_survive_a_restart() {
        let history = History::default();
        let user = Uuid::new_v4();
        {
            let trainer = trainer(&history, Arc::new(EventBus::new()));
            for i in 0..4 {
                let _ = append_and_train(&history, &trainer, record(user, "rice", i)).await;
            }
            assert_eq!(trainer.store().current(user).await.unwrap().version, 2);
        }

        let restarted = trainer(&history, Arc::new(EventBus::new()));
        restarted.load_persisted(user).await;
        assert_eq!(restarted.store().versions(user).await, vec![1, 2]);

        let next = append_and_train(&history, &restarted, record(user, "noodles", 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.version, 3);
    }

    #[tokio::test]
    async fn test_feedback_updates_the_model() {
        let history = History::default();
        let trainer = trainer(&history, Arc::new(EventBus::new()));
        let user = Uuid::new_v4();
        for i in 0..3 {
            let _ = append_and_train(&history, &trainer, record(user, "rice", i)).await;
        }
        let before = trainer.store().current(user).await.unwrap();

        let feedback = Feedback::new(FeedbackConfig {
            user_id: user,
            food_name: "rice".to_string(),
            reaction: Reaction::Dislike,
        });
        FeedbackRepository::append(&history, feedback.clone())
            .await
            .unwrap();
        let after = trainer.on_feedback(&feedback).await.unwrap().unwrap();

        assert!(after.version > before.version);
        assert!(after.score("rice", None) < before.score("rice", None));
    }
}
