use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::{NoContext, Timestamp, Uuid};

pub mod entities;
pub mod services;

#[derive(Clone, Debug, Default)]
pub struct MealwiseConfig {
    pub recognition: RecognitionConfig,
    pub merge: MergeConfig,
    pub validation: ValidationConfig,
    pub learning: LearningConfig,
    pub preference: PreferenceConfig,
    pub recommendation: RecommendationConfig,
    pub llm: LLMConfig,
    pub ocr_service: Option<OcrServiceConfig>,
}

#[derive(Clone, Debug)]
pub struct RecognitionConfig {
    /// Upper bound for a single backend call; slower backends count as failed.
    pub backend_timeout: Duration,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MergeConfig {
    pub max_edit_distance: usize,
    pub min_name_similarity: f64,
    pub region_iou_threshold: f64,
    pub database_bonus: f64,
    pub variance_penalty: f64,
    pub max_penalty: f64,
    /// Relative tolerance used when cross-checking a parsed value against the database.
    pub calorie_tolerance: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: 2,
            min_name_similarity: 0.6,
            region_iou_threshold: 0.5,
            database_bonus: 0.3,
            variance_penalty: 0.5,
            max_penalty: 0.5,
            calorie_tolerance: 0.1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ValidationConfig {
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub top_k: usize,
    pub awaiting_ttl: Duration,
    /// How often awaiting regions are checked against the time-to-live.
    pub sweep_interval: Duration,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.85,
            low_threshold: 0.3,
            top_k: 3,
            awaiting_ttl: Duration::from_secs(60 * 60 * 24),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LearningConfig {
    pub alpha: f64,
    pub w_min: f64,
    pub w_max: f64,
    pub rule_min: f64,
    pub rule_max: f64,
    /// How long applied correction ids and corrected regions are remembered for deduplication.
    pub dedup_retention: Duration,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            w_min: 0.1,
            w_max: 2.0,
            rule_min: 0.5,
            rule_max: 1.5,
            dedup_retention: Duration::from_secs(60 * 60 * 48),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PreferenceConfig {
    pub recency_half_life_days: f64,
    pub min_training_samples: u64,
    /// Number of incremental updates after which the next training is a full rebuild.
    pub full_retrain_threshold: u64,
    pub retained_versions: usize,
    pub feedback_weight: f64,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            recency_half_life_days: 14.0,
            min_training_samples: 10,
            full_retrain_threshold: 50,
            retained_versions: 5,
            feedback_weight: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    pub cold_start_days: usize,
    pub max_recommendations: usize,
    pub recency_window_days: i64,
    pub eaten_today_penalty: f64,
    pub recent_penalty: f64,
    /// Daily kcal split across slots when assembling meal combinations.
    pub daily_calorie_target: f64,
    pub max_combinations: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            cold_start_days: 6,
            max_recommendations: 5,
            recency_window_days: 3,
            eaten_today_penalty: 0.3,
            recent_penalty: 0.1,
            daily_calorie_target: 2000.0,
            max_combinations: 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LLMConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct OcrServiceConfig {
    pub backend_id: String,
    pub endpoint: String,
}

pub fn generate_timestamp() -> (DateTime<Utc>, Timestamp) {
    let now = Utc::now();
    let seconds = now.timestamp().try_into().unwrap_or(0);
    let timestamp = Timestamp::from_unix(NoContext, seconds, now.timestamp_subsec_nanos());

    (now, timestamp)
}

pub fn generate_uuid_v7() -> Uuid {
    let (_, timestamp) = generate_timestamp();
    Uuid::new_v7(timestamp)
}
