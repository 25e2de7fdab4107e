use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    common::generate_timestamp,
    meal::entities::{MealRecord, MealSlot},
    recognition::entities::{BackendProposal, MergedCandidate, MergedRegion, RegionLocator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegionState {
    Pending,
    AwaitingUser,
    Accepted,
    Rejected,
}

impl RegionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegionState::Accepted | RegionState::Rejected)
    }
}

/// One detected label region travelling through the validation state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Region {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub slot: MealSlot,
    pub eaten_at: DateTime<Utc>,
    pub locator: RegionLocator,
    pub state: RegionState,
    /// Ranked suggestions; emptied once the region reaches a terminal state.
    pub candidates: Vec<MergedCandidate>,
    pub proposals: Vec<BackendProposal>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct RegionConfig {
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub slot: MealSlot,
    pub eaten_at: DateTime<Utc>,
}

impl Region {
    pub fn new(config: RegionConfig, merged: MergedRegion) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            request_id: config.request_id,
            user_id: config.user_id,
            slot: config.slot,
            eaten_at: config.eaten_at,
            locator: merged.locator,
            state: RegionState::Pending,
            candidates: merged.candidates,
            proposals: merged.proposals,
            created_at: now,
            resolved_at: None,
        }
    }
}

/// External decision for a region awaiting the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserChoice {
    /// Accept the suggestion at `rank` (0 is the top suggestion).
    Confirm { rank: usize },
    /// Accept a user-typed name and value.
    Edit { food_name: String, calories: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Correction {
    pub id: Uuid,
    pub region_id: Uuid,
    pub user_id: Uuid,
    pub original: MergedCandidate,
    pub proposals: Vec<BackendProposal>,
    pub accepted_name: String,
    pub accepted_calories: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CorrectionConfig {
    pub region_id: Uuid,
    pub user_id: Uuid,
    pub original: MergedCandidate,
    pub proposals: Vec<BackendProposal>,
    pub accepted_name: String,
    pub accepted_calories: f64,
}

impl Correction {
    pub fn new(config: CorrectionConfig) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            region_id: config.region_id,
            user_id: config.user_id,
            original: config.original,
            proposals: config.proposals,
            accepted_name: config.accepted_name,
            accepted_calories: config.accepted_calories,
            created_at: now,
        }
    }
}

/// Result of the automatic pass over a pending region.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Accepted(MealRecord),
    Rejected { reason: String },
    AwaitingUser,
}

/// Result of an external resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Accepted {
        record: MealRecord,
        correction: Option<Correction>,
    },
    Rejected,
}
