use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::recognition::entities::BackendId;

pub const DEFAULT_TRUST_WEIGHT: f64 = 1.0;

/// Per-backend reliability coefficients. Unknown backends use the default weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrustWeights {
    pub weights: BTreeMap<BackendId, f64>,
    pub default_weight: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            default_weight: DEFAULT_TRUST_WEIGHT,
        }
    }
}

impl TrustWeights {
    pub fn get(&self, backend: &BackendId) -> f64 {
        self.weights
            .get(backend)
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn set(&mut self, backend: BackendId, weight: f64) {
        self.weights.insert(backend, weight);
    }
}

/// Learned scale applied to the merge rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RuleWeights {
    pub database_bonus: f64,
    pub variance_penalty: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            database_bonus: 1.0,
            variance_penalty: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LearningSnapshot {
    pub trust: TrustWeights,
    pub rules: RuleWeights,
    pub applied_corrections: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Value a user settled on for a food in an earlier correction.
#[derive(Debug, Clone, PartialEq)]
pub struct RememberedValue {
    pub food_name: String,
    pub calories: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Duplicate,
}
