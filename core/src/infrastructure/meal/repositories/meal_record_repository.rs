use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    meal::{entities::MealRecord, ports::MealRecordRepository},
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryMealRecordRepository {
    records: Arc<RwLock<HashMap<Uuid, Vec<MealRecord>>>>,
}

impl InMemoryMealRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MealRecordRepository for InMemoryMealRecordRepository {
    async fn append(&self, record: MealRecord) -> Result<MealRecord, CoreError> {
        let mut records = self.records.write().await;
        let history = records.entry(record.user_id).or_default();
        if history.iter().any(|r| r.id == record.id) {
            return Err(CoreError::InvalidInput(format!(
                "meal record {} already exists",
                record.id
            )));
        }
        history.push(record.clone());
        Ok(record)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<MealRecord>, CoreError> {
        let mut history = self
            .records
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        history.sort_by(|a, b| a.eaten_at.cmp(&b.eaten_at).then(a.id.cmp(&b.id)));
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::domain::meal::entities::{MealRecordConfig, MealSlot, Provenance};

    fn record(user_id: Uuid, hours_ago: i64, name: &str) -> MealRecord {
        MealRecord::new(MealRecordConfig {
            user_id,
            eaten_at: Utc::now() - Duration::hours(hours_ago),
            slot: MealSlot::Lunch,
            food_name: name.to_string(),
            calories: 100.0,
            provenance: Provenance::Manual,
        })
    }

    #[tokio::test]
    async fn test_history_is_per_user_and_oldest_first() {
        let repo = InMemoryMealRecordRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        repo.append(record(alice, 1, "rice")).await.unwrap();
        repo.append(record(alice, 5, "noodles")).await.unwrap();
        repo.append(record(bob, 2, "apple")).await.unwrap();

        let history = repo.list_by_user(alice).await.unwrap();
        let names: Vec<_> = history.iter().map(|r| r.food_name.as_str()).collect();
        assert_eq!(names, vec!["noodles", "rice"]);
        assert!(repo.list_by_user(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_is_not_an_upsert() {
        let repo = InMemoryMealRecordRepository::new();
        let r = record(Uuid::new_v4(), 0, "rice");
        repo.append(r.clone()).await.unwrap();
        assert!(repo.append(r).await.is_err());
    }
}
