use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    feedback::{entities::Feedback, ports::FeedbackRepository},
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryFeedbackRepository {
    feedback: Arc<RwLock<HashMap<Uuid, Vec<Feedback>>>>,
}

impl InMemoryFeedbackRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn append(&self, feedback: Feedback) -> Result<Feedback, CoreError> {
        self.feedback
            .write()
            .await
            .entry(feedback.user_id)
            .or_default()
            .push(feedback.clone());
        Ok(feedback)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Feedback>, CoreError> {
        let mut feedback = self
            .feedback
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        feedback.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(feedback)
    }
}
