use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    meal::entities::{MealRecord, MealSlot},
    recognition::entities::{BackendId, BackendStatus},
    validation::entities::{Region, UserChoice},
};

#[derive(Debug, Clone)]
pub struct RecognizeInput {
    pub user_id: Uuid,
    pub slot: MealSlot,
    pub eaten_at: Option<DateTime<Utc>>,
    pub image: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolveRegionInput {
    pub region_id: Uuid,
    /// `None` rejects the region.
    pub choice: Option<UserChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackendSummary {
    pub backend: BackendId,
    pub status: BackendStatus,
    pub candidates: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecognitionResult {
    pub request_id: Uuid,
    pub regions: Vec<Region>,
    /// Records created by automatic acceptance.
    pub records: Vec<MealRecord>,
    pub backends: Vec<BackendSummary>,
    pub dropped_fragments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegionResolution {
    pub region: Region,
    pub record: Option<MealRecord>,
    pub correction_id: Option<Uuid>,
}
