use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::common::generate_uuid_v7;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BackendId(pub String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Axis-aligned bounding box in relative image coordinates (0..1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegionLocator {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RegionLocator {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Locator used by backends that read the whole label without positions.
    pub fn whole_image() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn is_whole_image(&self) -> bool {
        self.x <= 0.0 && self.y <= 0.0 && self.width >= 1.0 && self.height >= 1.0
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn iou(&self, other: &RegionLocator) -> f64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Raw image bytes shared read-only between backends.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Bytes,
    pub digest: String,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let digest = hex::encode(Sha256::digest(&bytes));
        Self { bytes, digest }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecognitionCandidate {
    pub id: Uuid,
    pub backend: BackendId,
    pub raw_text: String,
    pub food_name: Option<String>,
    pub calories: Option<f64>,
    pub region: RegionLocator,
    pub confidence: f64,
}

impl RecognitionCandidate {
    /// Unparsed fragment as emitted by a backend.
    pub fn raw(
        backend: BackendId,
        raw_text: impl Into<String>,
        region: RegionLocator,
        confidence: f64,
    ) -> Self {
        Self {
            id: generate_uuid_v7(),
            backend,
            raw_text: raw_text.into(),
            food_name: None,
            calories: None,
            region,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// New candidate carrying parsed fields; the source is left untouched.
    pub fn with_parsed(&self, raw_text: &str, food_name: String, calories: f64) -> Self {
        Self {
            id: generate_uuid_v7(),
            backend: self.backend.clone(),
            raw_text: raw_text.to_string(),
            food_name: Some(food_name),
            calories: Some(calories),
            region: self.region,
            confidence: self.confidence,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.food_name.is_some() && self.calories.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackendStatus {
    Ok,
    Failed { reason: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackendOutput {
    pub backend: BackendId,
    pub status: BackendStatus,
    pub candidates: Vec<RecognitionCandidate>,
    pub elapsed_ms: u64,
}

impl BackendOutput {
    pub fn answered(&self) -> bool {
        self.status == BackendStatus::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseMatch {
    pub reference_id: String,
    pub canonical_name: String,
    pub canonical_calories: f64,
    /// Whether one of the contributing values is within tolerance of the canonical value.
    pub agrees: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MergedCandidate {
    pub food_name: String,
    pub calories: f64,
    pub merged_confidence: f64,
    /// Ordered by confidence, highest first.
    pub contributing: Vec<RecognitionCandidate>,
    pub database_match: Option<DatabaseMatch>,
    pub calorie_variance: f64,
    /// Calories come from this user's own earlier correction.
    #[serde(default)]
    pub user_confirmed: bool,
}

impl MergedCandidate {
    pub fn backend_count(&self) -> usize {
        let mut backends: Vec<&BackendId> = self.contributing.iter().map(|c| &c.backend).collect();
        backends.sort();
        backends.dedup();
        backends.len()
    }
}

/// Best proposal of one backend within a region, kept for correction attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackendProposal {
    pub backend: BackendId,
    pub food_name: String,
    pub calories: f64,
    pub confidence: f64,
}

/// Ranked merge output for one detected region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MergedRegion {
    pub locator: RegionLocator,
    pub candidates: Vec<MergedCandidate>,
    pub proposals: Vec<BackendProposal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_of_identical_boxes_is_one() {
        let a = RegionLocator::new(0.1, 0.1, 0.2, 0.2);
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_iou_of_disjoint_boxes_is_zero() {
        let a = RegionLocator::new(0.0, 0.0, 0.1, 0.1);
        let b = RegionLocator::new(0.5, 0.5, 0.1, 0.1);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_image_digest_is_stable() {
        let a = ImageInput::new(vec![1u8, 2, 3]);
        let b = ImageInput::new(vec![1u8, 2, 3]);
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.digest.len(), 64);
    }

    #[test]
    fn test_with_parsed_keeps_source_unchanged() {
        let raw = RecognitionCandidate::raw(
            BackendId::new("ocr"),
            "apple 52 kcal",
            RegionLocator::whole_image(),
            0.8,
        );
        let parsed = raw.with_parsed("apple 52 kcal", "apple".to_string(), 52.0);
        assert!(raw.food_name.is_none());
        assert_eq!(parsed.food_name.as_deref(), Some("apple"));
        assert_eq!(parsed.backend, raw.backend);
        assert_ne!(parsed.id, raw.id);
    }
}
