use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    feedback::entities::{Feedback, Reaction},
    meal::entities::{MealRecord, MealSlot},
    preference::tokenizer::tokenize,
};

/// Exponents beyond this re-anchor the decayed sums to keep them finite.
const MAX_DECAY_EXPONENT: f64 = 60.0;

/// Sufficient statistics of one user's history.
///
/// Updated one record or feedback entry at a time; a model can be trained from them
/// without replaying the history.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceStatistics {
    pub user_id: Uuid,
    /// Number of meal records seen, the document count for IDF.
    pub documents: u64,
    pub doc_freq: BTreeMap<String, u64>,
    pub slot_freq: BTreeMap<MealSlot, BTreeMap<String, u64>>,
    pub labels: BTreeMap<String, f64>,
    pub exposures: BTreeMap<String, u64>,
    pub record_count: u64,
    pub feedback_count: u64,
    pub days: BTreeSet<NaiveDate>,
    pub deltas_since_full: u64,
    decayed: BTreeMap<String, f64>,
    anchor: Option<DateTime<Utc>>,
    seen: HashSet<Uuid>,
}

impl PreferenceStatistics {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            documents: 0,
            doc_freq: BTreeMap::new(),
            slot_freq: BTreeMap::new(),
            labels: BTreeMap::new(),
            exposures: BTreeMap::new(),
            record_count: 0,
            feedback_count: 0,
            days: BTreeSet::new(),
            deltas_since_full: 0,
            decayed: BTreeMap::new(),
            anchor: None,
            seen: HashSet::new(),
        }
    }

    /// Rebuilds statistics from the full history.
    pub fn rebuild(
        user_id: Uuid,
        records: &[MealRecord],
        feedback: &[Feedback],
        half_life_days: f64,
    ) -> Self {
        let mut stats = Self::new(user_id);
        for record in records.iter().filter(|r| r.user_id == user_id) {
            stats.ingest_record(record, half_life_days);
        }
        for entry in feedback.iter().filter(|f| f.user_id == user_id) {
            stats.ingest_feedback(entry, half_life_days);
        }
        stats.deltas_since_full = 0;
        stats
    }

    /// Returns false when the record was already ingested.
    pub fn ingest_record(&mut self, record: &MealRecord, half_life_days: f64) -> bool {
        if !self.seen.insert(record.id) {
            return false;
        }

        let tokens = tokenize(&record.food_name);
        let weight = self.decay_weight(record.eaten_at, half_life_days);
        let slot = self.slot_freq.entry(record.slot).or_default();

        for token in &tokens {
            *self.doc_freq.entry(token.clone()).or_default() += 1;
            *slot.entry(token.clone()).or_default() += 1;
            *self.decayed.entry(token.clone()).or_default() += weight;
        }

        self.documents += 1;
        self.record_count += 1;
        self.days.insert(record.day());
        self.deltas_since_full += 1;
        true
    }

    /// Returns false when the feedback was already ingested.
    pub fn ingest_feedback(&mut self, feedback: &Feedback, _half_life_days: f64) -> bool {
        if !self.seen.insert(feedback.id) {
            return false;
        }

        for token in tokenize(&feedback.food_name) {
            match feedback.reaction {
                Reaction::Like => *self.labels.entry(token).or_default() += 1.0,
                Reaction::Dislike => *self.labels.entry(token).or_default() -= 1.0,
                Reaction::AlreadyEaten => *self.exposures.entry(token).or_default() += 1,
            }
        }

        self.feedback_count += 1;
        self.deltas_since_full += 1;
        true
    }

    /// Recency-weighted term frequency scaled so the most recent-and-frequent term is 1.
    pub fn recency_weights(&self) -> BTreeMap<String, f64> {
        let max = self.decayed.values().copied().fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return BTreeMap::new();
        }
        self.decayed
            .iter()
            .map(|(token, value)| (token.clone(), value / max))
            .collect()
    }

    pub fn sample_count(&self) -> u64 {
        self.record_count + self.feedback_count
    }

    pub fn distinct_days(&self) -> usize {
        self.days.len()
    }

    pub fn is_finite(&self) -> bool {
        self.decayed.values().all(|v| v.is_finite())
            && self.labels.values().all(|v| v.is_finite())
    }

    fn decay_weight(&mut self, at: DateTime<Utc>, half_life_days: f64) -> f64 {
        let half_life = if half_life_days > 0.0 {
            half_life_days
        } else {
            1.0
        };
        let anchor = *self.anchor.get_or_insert(at);
        let exponent = (at - anchor).num_seconds() as f64 / 86_400.0 / half_life;

        if exponent > MAX_DECAY_EXPONENT {
            let rescale = (-exponent).exp2();
            for value in self.decayed.values_mut() {
                *value *= rescale;
            }
            self.anchor = Some(at);
            return 1.0;
        }
        exponent.exp2()
    }
}
