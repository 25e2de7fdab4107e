use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError, learning::ports::CorrectionRepository,
    validation::entities::Correction,
};

/// Archive of consumed corrections, in consumption order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorrectionRepository {
    archive: Arc<RwLock<Vec<Correction>>>,
}

impl InMemoryCorrectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.archive.read().await.len()
    }
}

impl CorrectionRepository for InMemoryCorrectionRepository {
    async fn archive(&self, correction: Correction) -> Result<Correction, CoreError> {
        let mut archive = self.archive.write().await;
        if !archive.iter().any(|c| c.id == correction.id) {
            archive.push(correction.clone());
        }
        Ok(correction)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Correction>, CoreError> {
        Ok(self
            .archive
            .read()
            .await
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }
}
