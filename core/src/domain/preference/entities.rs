use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    common::{PreferenceConfig, entities::app_errors::CoreError},
    food::helpers::normalize_food_name,
    meal::entities::MealSlot,
    preference::{statistics::PreferenceStatistics, tokenizer::tokenize},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrainingKind {
    Incremental,
    Full,
}

/// Immutable, versioned per-user preference model.
///
/// `version` is assigned by the model store on publication; a freshly trained model
/// carries 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PreferenceModel {
    pub user_id: Uuid,
    pub version: u64,
    pub kind: TrainingKind,
    pub feature_weights: BTreeMap<String, f64>,
    pub idf: BTreeMap<String, f64>,
    pub trained_on: u64,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SimilarFood {
    pub food_name: String,
    pub similarity: f64,
}

fn slot_feature(slot: MealSlot, token: &str) -> String {
    format!("slot:{}:{}", slot.as_str(), token)
}

impl PreferenceModel {
    /// Model without features, used for name similarity before any training.
    pub fn untrained(user_id: Uuid) -> Self {
        Self {
            user_id,
            version: 0,
            kind: TrainingKind::Full,
            feature_weights: BTreeMap::new(),
            idf: BTreeMap::new(),
            trained_on: 0,
            trained_at: Utc::now(),
        }
    }

    pub fn train(
        stats: &PreferenceStatistics,
        kind: TrainingKind,
        config: &PreferenceConfig,
    ) -> Result<Self, CoreError> {
        let samples = stats.sample_count();
        if samples < config.min_training_samples || stats.record_count == 0 {
            return Err(CoreError::TrainingFailed(format!(
                "insufficient data: {} samples, {} required",
                samples, config.min_training_samples
            )));
        }

        let documents = stats.documents as f64;
        let mut idf = BTreeMap::new();
        for token in stats.doc_freq.keys().chain(stats.labels.keys()) {
            let df = stats.doc_freq.get(token).copied().unwrap_or(0) as f64;
            idf.insert(token.clone(), ((1.0 + documents) / (1.0 + df)).ln() + 1.0);
        }
        let idf_max = idf.values().copied().fold(1.0_f64, f64::max);

        let recency = stats.recency_weights();
        let mut feature_weights = BTreeMap::new();
        for (token, token_idf) in &idf {
            let r = recency.get(token).copied().unwrap_or(0.0);
            let label = stats.labels.get(token).copied().unwrap_or(0.0);
            let weight =
                r * (0.5 + 0.5 * token_idf / idf_max) + config.feedback_weight * label.tanh();
            feature_weights.insert(token.clone(), weight);
        }

        for (slot, counts) in &stats.slot_freq {
            let total: u64 = counts.values().sum();
            if total == 0 {
                continue;
            }
            for (token, count) in counts {
                let share = *count as f64 / total as f64;
                let r = recency.get(token).copied().unwrap_or(0.0);
                feature_weights.insert(slot_feature(*slot, token), 0.5 * share * r);
            }
        }

        if let Some((token, _)) = feature_weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(CoreError::TrainingFailed(format!(
                "non-finite weight for feature {}",
                token
            )));
        }

        Ok(Self {
            user_id: stats.user_id,
            version: 0,
            kind,
            feature_weights,
            idf,
            trained_on: samples,
            trained_at: Utc::now(),
        })
    }

    /// Preference for a food, optionally within a slot, in (0, 1). Unknown foods score 0.5.
    pub fn score(&self, food_name: &str, slot: Option<MealSlot>) -> f64 {
        let tokens = tokenize(food_name);
        if tokens.is_empty() {
            return 0.5;
        }

        let sum: f64 = tokens
            .iter()
            .map(|token| {
                let slot_weight = slot
                    .and_then(|slot| self.feature_weights.get(&slot_feature(slot, token)))
                    .copied()
                    .unwrap_or(0.0);
                self.feature_weights.get(token).copied().unwrap_or(0.0) + slot_weight
            })
            .sum();

        0.5 + 0.5 * (sum / (tokens.len() as f64).sqrt()).tanh()
    }

    /// Names from `candidates` closest to `food_name` by IDF-weighted token cosine.
    pub fn similar_foods(
        &self,
        food_name: &str,
        candidates: &[String],
        limit: usize,
    ) -> Vec<SimilarFood> {
        let query = normalize_food_name(food_name);
        let query_vector = self.vector(food_name);
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut similar: Vec<SimilarFood> = candidates
            .iter()
            .filter(|name| {
                let normalized = normalize_food_name(name);
                normalized != query && seen.insert(normalized)
            })
            .filter_map(|name| {
                let similarity = cosine(&query_vector, &self.vector(name));
                (similarity > 0.0).then(|| SimilarFood {
                    food_name: name.clone(),
                    similarity,
                })
            })
            .collect();

        similar.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.food_name.cmp(&b.food_name))
        });
        similar.truncate(limit);
        similar
    }

    fn vector(&self, name: &str) -> BTreeMap<String, f64> {
        let unseen = self.idf.values().copied().fold(1.0_f64, f64::max);
        tokenize(name)
            .into_iter()
            .map(|token| {
                let weight = self.idf.get(&token).copied().unwrap_or(unseen);
                (token, weight)
            })
            .collect()
    }
}

fn cosine(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(token, x)| b.get(token).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
