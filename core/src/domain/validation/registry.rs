use std::{collections::HashMap, future::Future, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    validation::{
        entities::{Region, RegionState},
        gate::ValidationGate,
    },
};

/// Regions of in-flight recognition requests.
///
/// Terminal regions are kept (without candidates) until they age out; a late
/// resolution is reported as already resolved rather than unknown.
pub struct RegionRegistry {
    regions: Mutex<HashMap<Uuid, Region>>,
    ttl: Duration,
}

impl RegionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            regions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn insert(&self, region: Region) {
        self.regions.lock().await.insert(region.id, region);
    }

    pub async fn get(&self, region_id: Uuid) -> Option<Region> {
        self.regions.lock().await.get(&region_id).cloned()
    }

    /// Decides on a copy of the stored region, then runs `persist` with the registry lock
    /// still held. The stored region only takes the decided state when `persist` succeeds.
    pub async fn transition<T, U, Fut>(
        &self,
        region_id: Uuid,
        decide: impl FnOnce(&mut Region) -> Result<T, CoreError>,
        persist: impl FnOnce(T) -> Fut,
    ) -> Result<(U, Region), CoreError>
    where
        Fut: Future<Output = Result<U, CoreError>>,
    {
        let mut regions = self.regions.lock().await;
        let mut next = regions
            .get(&region_id)
            .cloned()
            .ok_or(CoreError::NotFound)?;
        let decided = decide(&mut next)?;
        let persisted = persist(decided).await?;
        regions.insert(region_id, next.clone());
        Ok((persisted, next))
    }

    pub async fn awaiting_for_user(&self, user_id: Uuid) -> Vec<Region> {
        let mut awaiting: Vec<Region> = self
            .regions
            .lock()
            .await
            .values()
            .filter(|r| r.user_id == user_id && r.state == RegionState::AwaitingUser)
            .cloned()
            .collect();
        awaiting.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        awaiting
    }

    /// Rejects regions left awaiting longer than the time-to-live and forgets terminal
    /// regions older than it. Returns the regions that were rejected by this sweep.
    pub async fn sweep(&self, gate: &ValidationGate, now: DateTime<Utc>) -> Vec<Region> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let mut regions = self.regions.lock().await;
        let mut expired = Vec::new();

        for region in regions.values_mut() {
            if region.state == RegionState::AwaitingUser
                && now - region.created_at >= ttl
                && gate.expire(region).is_ok()
            {
                expired.push(region.clone());
            }
        }

        regions.retain(|_, r| {
            !(r.state.is_terminal() && r.resolved_at.is_some_and(|at| now - at >= ttl))
        });
        expired
    }

    pub async fn len(&self) -> usize {
        self.regions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        common::ValidationConfig,
        meal::entities::MealSlot,
        recognition::entities::{MergedRegion, RegionLocator},
        validation::entities::{RegionConfig, UserChoice},
    };

    fn empty_region(user_id: Uuid) -> Region {
        Region::new(
            RegionConfig {
                request_id: Uuid::new_v4(),
                user_id,
                slot: MealSlot::Dinner,
                eaten_at: Utc::now(),
            },
            MergedRegion {
                locator: RegionLocator::whole_image(),
                candidates: Vec::new(),
                proposals: Vec::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_sweep_rejects_stale_regions() {
        let gate = ValidationGate::new(ValidationConfig::default());
        let registry = RegionRegistry::new(Duration::from_secs(60));
        let user = Uuid::new_v4();

        let mut region = empty_region(user);
        gate.evaluate(&mut region).unwrap();
        let id = region.id;
        registry.insert(region).await;

        assert!(registry.sweep(&gate, Utc::now()).await.is_empty());
        assert_eq!(registry.awaiting_for_user(user).await.len(), 1);

        let later = Utc::now() + chrono::Duration::seconds(61);
        let expired = registry.sweep(&gate, later).await;
        assert_eq!(expired.len(), 1);
        assert_eq!(
            registry.get(id).await.map(|r| r.state),
            Some(RegionState::Rejected)
        );

        let result = registry
            .transition(
                id,
                |r| gate.resolve(r, Some(UserChoice::Confirm { rank: 0 })),
                |resolution| async move { Ok(resolution) },
            )
            .await;
        assert!(matches!(result, Err(CoreError::RegionAlreadyResolved(r)) if r == id));

        let much_later = later + chrono::Duration::seconds(120);
        registry.sweep(&gate, much_later).await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_region_is_not_found() {
        let registry = RegionRegistry::new(Duration::from_secs(60));
        let result = registry
            .transition(Uuid::new_v4(), |_| Ok(()), |()| async { Ok(()) })
            .await;
        assert!(matches!(result, Err(CoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_the_region_awaiting() {
        let gate = ValidationGate::new(ValidationConfig::default());
        let registry = RegionRegistry::new(Duration::from_secs(60));
        let user = Uuid::new_v4();
        let mut region = empty_region(user);
        gate.evaluate(&mut region).unwrap();
        let id = region.id;
        registry.insert(region).await;

        let choice = || {
            Some(UserChoice::Edit {
                food_name: "toast".to_string(),
                calories: 250.0,
            })
        };
        let failed = registry
            .transition(
                id,
                |r| gate.resolve(r, choice()),
                |_| async { Err::<(), _>(CoreError::InternalServerError) },
            )
            .await;
        assert!(failed.is_err());
        assert_eq!(
            registry.get(id).await.map(|r| r.state),
            Some(RegionState::AwaitingUser)
        );

        let (_, resolved) = registry
            .transition(id, |r| gate.resolve(r, choice()), |_| async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(resolved.state, RegionState::Accepted);
        assert_eq!(registry.awaiting_for_user(user).await.len(), 0);
    }
}
