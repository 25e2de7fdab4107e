use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::{common::entities::app_errors::CoreError, preference::entities::PreferenceModel};

#[derive(Debug, Default)]
struct UserModels {
    current: Option<u64>,
    next_version: u64,
    versions: VecDeque<Arc<PreferenceModel>>,
}

impl UserModels {
    fn find(&self, version: u64) -> Option<&Arc<PreferenceModel>> {
        self.versions.iter().find(|m| m.version == version)
    }
}

/// Versioned per-user models. Readers get an `Arc` to a complete model; publishing
/// swaps the current pointer under the write lock, so no reader sees a partial update.
#[derive(Debug)]
pub struct ModelStore {
    retained_versions: usize,
    models: RwLock<HashMap<Uuid, UserModels>>,
}

impl ModelStore {
    pub fn new(retained_versions: usize) -> Self {
        Self {
            retained_versions: retained_versions.max(1),
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Assigns the next version, makes it current and drops the oldest non-current versions.
    pub async fn publish(&self, mut model: PreferenceModel) -> Arc<PreferenceModel> {
        let mut models = self.models.write().await;
        let user = models.entry(model.user_id).or_default();

        user.next_version += 1;
        model.version = user.next_version;
        let model = Arc::new(model);
        user.versions.push_back(Arc::clone(&model));
        user.current = Some(model.version);

        while user.versions.len() > self.retained_versions {
            let Some(position) = user
                .versions
                .iter()
                .position(|m| Some(m.version) != user.current)
            else {
                break;
            };
            user.versions.remove(position);
        }

        model
    }

    /// Whether the user has been published to or restored in this process.
    pub async fn knows(&self, user_id: Uuid) -> bool {
        self.models.read().await.contains_key(&user_id)
    }

    /// Seeds a user from persisted versions, keeping the newest retained ones and making
    /// the highest current. A user already holding versions is left alone.
    pub async fn restore(&self, user_id: Uuid, mut persisted: Vec<PreferenceModel>) -> usize {
        let mut models = self.models.write().await;
        let user = models.entry(user_id).or_default();
        if !user.versions.is_empty() {
            return 0;
        }

        persisted.retain(|m| m.user_id == user_id);
        persisted.sort_by_key(|m| m.version);
        persisted.dedup_by_key(|m| m.version);
        let skip = persisted.len().saturating_sub(self.retained_versions);
        user.versions = persisted.into_iter().skip(skip).map(Arc::new).collect();
        user.current = user.versions.back().map(|m| m.version);
        user.next_version = user.next_version.max(user.current.unwrap_or(0));
        user.versions.len()
    }

    pub async fn current(&self, user_id: Uuid) -> Option<Arc<PreferenceModel>> {
        let models = self.models.read().await;
        let user = models.get(&user_id)?;
        user.find(user.current?).cloned()
    }

    pub async fn version(&self, user_id: Uuid, version: u64) -> Option<Arc<PreferenceModel>> {
        let models = self.models.read().await;
        models.get(&user_id)?.find(version).cloned()
    }

    /// Retained versions of a user, oldest first.
    pub async fn versions(&self, user_id: Uuid) -> Vec<u64> {
        let models = self.models.read().await;
        models
            .get(&user_id)
            .map(|user| user.versions.iter().map(|m| m.version).collect())
            .unwrap_or_default()
    }

    pub async fn rollback(
        &self,
        user_id: Uuid,
        version: u64,
    ) -> Result<Arc<PreferenceModel>, CoreError> {
        let mut models = self.models.write().await;
        let user = models.get_mut(&user_id).ok_or(CoreError::NotFound)?;
        let model = user.find(version).cloned().ok_or(CoreError::NotFound)?;
        user.current = Some(version);
        info!(%user_id, version, "preference model rolled back");
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::domain::preference::entities::TrainingKind;

    fn model(user_id: Uuid, value: f64) -> PreferenceModel {
        PreferenceModel {
            user_id,
            version: 0,
            kind: TrainingKind::Incremental,
            feature_weights: BTreeMap::from([("a".to_string(), value), ("b".to_string(), value)]),
            idf: BTreeMap::new(),
            trained_on: value as u64,
            trained_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_assigns_increasing_versions_and_retains_last_n() {
        let store = ModelStore::new(3);
        let user = Uuid::new_v4();
        for i in 0..5 {
            store.publish(model(user, i as f64)).await;
        }

        assert_eq!(store.versions(user).await, vec![3, 4, 5]);
        assert_eq!(store.current(user).await.unwrap().version, 5);
    }

    #[tokio::test]
    async fn test_restore_resumes_versioning_after_persisted_models() {
        let store = ModelStore::new(2);
        let user = Uuid::new_v4();
        let persisted: Vec<PreferenceModel> = (1..=3)
            .map(|v| PreferenceModel {
                version: v,
                ..model(user, v as f64)
            })
            .collect();

        assert_eq!(store.restore(user, persisted.clone()).await, 2);
        assert_eq!(store.versions(user).await, vec![2, 3]);
        assert_eq!(store.current(user).await.unwrap().version, 3);
        assert_eq!(store.restore(user, persisted).await, 0);

        let next = store.publish(model(user, 9.0)).await;
        assert_eq!(next.version, 4);
    }

    #[tokio::test]
    async fn test_rollback_keeps_current_through_retention() {
        let store = ModelStore::new(2);
        let user = Uuid::new_v4();
        store.publish(model(user, 1.0)).await;
        store.publish(model(user, 2.0)).await;

        let rolled = store.rollback(user, 1).await.unwrap();
        assert_eq!(rolled.version, 1);
        assert_eq!(store.current(user).await.unwrap().version, 1);

        assert!(matches!(
            store.rollback(user, 9).await,
            Err(CoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_model() {
        let store = ModelStore::new(2);
        assert!(store.current(Uuid::new_v4()).await.is_none());
        assert!(store.versions(Uuid::new_v4()).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_never_see_partial_models() {
        let store = Arc::new(ModelStore::new(5));
        let user = Uuid::new_v4();
        store.publish(model(user, 0.0)).await;

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 1..=200 {
                    store.publish(model(user, i as f64)).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let mut last_version = 0;
                    for _ in 0..500 {
                        let current = store.current(user).await.unwrap();
                        assert_eq!(current.feature_weights["a"], current.feature_weights["b"]);
                        assert!(current.version >= last_version);
                        last_version = current.version;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(store.current(user).await.unwrap().version, 201);
    }
}
