use std::{cmp::Ordering, collections::BTreeMap, collections::HashMap};

use strsim::{levenshtein, normalized_levenshtein};

use crate::domain::{
    common::MergeConfig,
    food::{
        FoodReference,
        helpers::{calories_agree, normalize_food_name},
    },
    learning::entities::{RememberedValue, RuleWeights, TrustWeights},
    recognition::entities::{
        BackendId, BackendProposal, DatabaseMatch, MergedCandidate, MergedRegion,
        RecognitionCandidate, RegionLocator,
    },
};

/// Inputs the merge depends on besides the candidates themselves.
pub struct MergeContext<'a> {
    pub trust: &'a TrustWeights,
    pub rules: &'a RuleWeights,
    /// Backends that returned successfully, failed ones do not dilute support.
    pub answered: &'a [BackendId],
    /// Reference entries keyed by normalized candidate name, resolved before merging.
    pub references: &'a HashMap<String, FoodReference>,
    /// The user's own earlier corrections keyed by normalized name.
    pub remembered: &'a HashMap<String, RememberedValue>,
}

/// Floor for a value the user already confirmed once.
pub const REMEMBERED_CONFIDENCE: f64 = 0.95;

pub struct ConfidenceMerger {
    config: MergeConfig,
}

impl ConfidenceMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Ranked candidates per detected region. Pure: same input, same output.
    pub fn merge(
        &self,
        candidates: &[RecognitionCandidate],
        ctx: &MergeContext<'_>,
    ) -> Vec<MergedRegion> {
        let mut parsed: Vec<&RecognitionCandidate> =
            candidates.iter().filter(|c| c.is_parsed()).collect();
        parsed.sort_by(|a, b| candidate_order(a, b));

        self.cluster_regions(parsed)
            .into_iter()
            .map(|(locator, members)| {
                let mut merged: Vec<MergedCandidate> = self
                    .group_names(&members)
                    .into_iter()
                    .map(|group| self.merge_group(group, ctx))
                    .collect();
                merged.sort_by(rank_order);

                MergedRegion {
                    locator,
                    candidates: merged,
                    proposals: backend_proposals(&members),
                }
            })
            .collect()
    }

    fn names_similar(&self, a: &str, b: &str) -> bool {
        a == b
            || (levenshtein(a, b) <= self.config.max_edit_distance
                && normalized_levenshtein(a, b) >= self.config.min_name_similarity)
    }

    fn cluster_regions<'c>(
        &self,
        candidates: Vec<&'c RecognitionCandidate>,
    ) -> Vec<(RegionLocator, Vec<&'c RecognitionCandidate>)> {
        let (localized, unlocalized): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| !c.region.is_whole_image());

        let mut clusters: Vec<(RegionLocator, Vec<&RecognitionCandidate>)> = Vec::new();
        for candidate in localized {
            match clusters
                .iter_mut()
                .find(|(locator, _)| locator.iou(&candidate.region) >= self.config.region_iou_threshold)
            {
                Some((_, members)) => members.push(candidate),
                None => clusters.push((candidate.region, vec![candidate])),
            }
        }

        // unlocalized readings join the region whose text they agree with
        let mut leftover = Vec::new();
        for candidate in unlocalized {
            let name = name_key(candidate);
            let target = clusters.iter_mut().find(|(_, members)| {
                members
                    .iter()
                    .any(|m| self.names_similar(&name_key(m), &name))
            });
            match target {
                Some((_, members)) => members.push(candidate),
                None => leftover.push(candidate),
            }
        }
        if !leftover.is_empty() {
            clusters.push((RegionLocator::whole_image(), leftover));
        }

        clusters
    }

    fn group_names<'c>(
        &self,
        members: &[&'c RecognitionCandidate],
    ) -> Vec<Vec<&'c RecognitionCandidate>> {
        let mut sorted = members.to_vec();
        sorted.sort_by(|a, b| {
            name_key(a)
                .cmp(&name_key(b))
                .then_with(|| candidate_order(a, b))
        });

        let mut groups: Vec<(String, Vec<&RecognitionCandidate>)> = Vec::new();
        for candidate in sorted {
            let key = name_key(candidate);
            match groups
                .iter_mut()
                .find(|(group_key, _)| self.names_similar(group_key, &key))
            {
                Some((_, group)) => group.push(candidate),
                None => groups.push((key, vec![candidate])),
            }
        }
        groups.into_iter().map(|(_, group)| group).collect()
    }

    fn merge_group(
        &self,
        mut members: Vec<&RecognitionCandidate>,
        ctx: &MergeContext<'_>,
    ) -> MergedCandidate {
        members.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| candidate_order(a, b))
        });

        let mut best_per_backend: BTreeMap<&BackendId, f64> = BTreeMap::new();
        for member in &members {
            let best = best_per_backend.entry(&member.backend).or_insert(0.0);
            *best = best.max(member.confidence);
        }

        let answered_weight: f64 = ctx.answered.iter().map(|b| ctx.trust.get(b)).sum();
        let denominator = if answered_weight > 0.0 {
            answered_weight
        } else {
            best_per_backend.keys().map(|b| ctx.trust.get(b)).sum()
        };
        let support = if denominator > 0.0 {
            best_per_backend
                .iter()
                .map(|(backend, confidence)| ctx.trust.get(backend) * confidence)
                .sum::<f64>()
                / denominator
        } else {
            0.0
        };

        let values: Vec<f64> = members.iter().filter_map(|m| m.calories).collect();
        let (mean, variance) = mean_and_variance(&values);
        let cv = if mean > 0.0 { variance.sqrt() / mean } else { 0.0 };
        let penalty = (self.config.variance_penalty * ctx.rules.variance_penalty * cv)
            .min(self.config.max_penalty);
        let base = (support.clamp(0.0, 1.0) - penalty).clamp(0.0, 1.0);

        let lead = members
            .iter()
            .copied()
            .reduce(|best, m| {
                if ctx.trust.get(&m.backend) * m.confidence
                    > ctx.trust.get(&best.backend) * best.confidence
                {
                    m
                } else {
                    best
                }
            });
        let lead_name = lead.and_then(|c| c.food_name.clone()).unwrap_or_default();
        let lead_calories = lead.and_then(|c| c.calories).unwrap_or_default();

        let reference = members
            .iter()
            .find_map(|m| ctx.references.get(&name_key(m)));

        // beta of the scale is reserved for database agreement
        let beta = (self.config.database_bonus * ctx.rules.database_bonus).clamp(0.0, 0.9);
        let (merged_confidence, calories, database_match) = match reference {
            Some(reference) => {
                let closest = members
                    .iter()
                    .filter_map(|m| m.calories)
                    .min_by(|a, b| {
                        (a - reference.calories)
                            .abs()
                            .total_cmp(&(b - reference.calories).abs())
                    })
                    .unwrap_or(lead_calories);
                let agrees =
                    calories_agree(closest, reference.calories, self.config.calorie_tolerance);
                let agreement = if agrees { 1.0 } else { 0.5 };

                (
                    (1.0 - beta) * base + beta * agreement,
                    closest,
                    Some(DatabaseMatch {
                        reference_id: reference.id.clone(),
                        canonical_name: reference.name.clone(),
                        canonical_calories: reference.calories,
                        agrees,
                    }),
                )
            }
            None => ((1.0 - beta) * base, lead_calories, None),
        };

        let remembered = members
            .iter()
            .find_map(|m| ctx.remembered.get(&name_key(m)));
        let (food_name, calories, merged_confidence) = match remembered {
            Some(value) => (
                value.food_name.clone(),
                value.calories,
                merged_confidence.max(REMEMBERED_CONFIDENCE),
            ),
            None => (lead_name, calories, merged_confidence),
        };

        MergedCandidate {
            food_name,
            calories,
            merged_confidence: merged_confidence.clamp(0.0, 1.0),
            contributing: members.into_iter().cloned().collect(),
            database_match,
            calorie_variance: variance,
            user_confirmed: remembered.is_some(),
        }
    }
}

fn name_key(candidate: &RecognitionCandidate) -> String {
    candidate
        .food_name
        .as_deref()
        .map(normalize_food_name)
        .unwrap_or_default()
}

fn candidate_order(a: &RecognitionCandidate, b: &RecognitionCandidate) -> Ordering {
    a.region
        .y
        .total_cmp(&b.region.y)
        .then_with(|| a.region.x.total_cmp(&b.region.x))
        .then_with(|| a.backend.cmp(&b.backend))
        .then_with(|| name_key(a).cmp(&name_key(b)))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| {
            a.calories
                .unwrap_or_default()
                .total_cmp(&b.calories.unwrap_or_default())
        })
        .then_with(|| a.raw_text.cmp(&b.raw_text))
}

/// Highest confidence first; then more backends, lower variance, name.
fn rank_order(a: &MergedCandidate, b: &MergedCandidate) -> Ordering {
    b.merged_confidence
        .total_cmp(&a.merged_confidence)
        .then_with(|| b.backend_count().cmp(&a.backend_count()))
        .then_with(|| a.calorie_variance.total_cmp(&b.calorie_variance))
        .then_with(|| normalize_food_name(&a.food_name).cmp(&normalize_food_name(&b.food_name)))
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

fn backend_proposals(members: &[&RecognitionCandidate]) -> Vec<BackendProposal> {
    let mut best: BTreeMap<&BackendId, &RecognitionCandidate> = BTreeMap::new();
    for &member in members {
        best.entry(&member.backend)
            .and_modify(|current| {
                if member.confidence > current.confidence {
                    *current = member;
                }
            })
            .or_insert(member);
    }

    best.into_values()
        .map(|c| BackendProposal {
            backend: c.backend.clone(),
            food_name: c.food_name.clone().unwrap_or_default(),
            calories: c.calories.unwrap_or_default(),
            confidence: c.confidence,
        })
        .collect()
}
