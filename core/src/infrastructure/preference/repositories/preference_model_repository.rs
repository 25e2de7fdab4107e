use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    preference::{entities::PreferenceModel, ports::PreferenceModelRepository},
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceModelRepository {
    models: Arc<RwLock<HashMap<Uuid, Vec<PreferenceModel>>>>,
}

impl InMemoryPreferenceModelRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceModelRepository for InMemoryPreferenceModelRepository {
    async fn save(&self, model: PreferenceModel) -> Result<PreferenceModel, CoreError> {
        let mut models = self.models.write().await;
        let versions = models.entry(model.user_id).or_default();
        match versions.iter_mut().find(|m| m.version == model.version) {
            Some(existing) => *existing = model.clone(),
            None => versions.push(model.clone()),
        }
        Ok(model)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PreferenceModel>, CoreError> {
        let mut versions = self
            .models
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        versions.sort_by_key(|m| m.version);
        Ok(versions)
    }
}
