use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    common::RecommendationConfig,
    feedback::{
        entities::{Feedback, Reaction},
        helpers::latest_reactions,
    },
    food::{
        entities::{FoodCategory, FoodReference, FoodTag},
        helpers::normalize_food_name,
    },
    meal::entities::{MealRecord, MealSlot},
    preference::entities::PreferenceModel,
    profile::entities::UserProfile,
    recommendation::{
        combination::{calorie_share, combine},
        entities::{RationaleTag, Recommendation, RecommendationTier, RecommendedFood},
        fusion::{cycle_affinity, factor, has_personality_signal, personality_affinity},
    },
};

pub struct RankingInput<'a> {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub slot: Option<MealSlot>,
    pub catalog: &'a [FoodReference],
    pub history: &'a [MealRecord],
    pub feedback: &'a [Feedback],
    pub profile: &'a UserProfile,
    pub model: Option<Arc<PreferenceModel>>,
    pub now: DateTime<Utc>,
}

#[derive(Debug)]
struct Candidate {
    name: String,
    names: Vec<String>,
    calories: Option<f64>,
    category: Option<FoodCategory>,
    tags: Vec<FoodTag>,
    popularity: f64,
}

#[derive(Debug, Default)]
struct Exposure {
    times_eaten: usize,
    last_day: Option<NaiveDate>,
}

pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn rank(&self, input: RankingInput<'_>) -> Recommendation {
        let candidates = self.candidates(input.catalog, input.history);
        let reactions = latest_reactions(input.feedback);
        let exposures = exposures(input.history, input.day);
        let reported = self.reported_as_eaten(input.feedback, input.day);

        let history_days: BTreeSet<NaiveDate> = input
            .history
            .iter()
            .map(|r| r.day())
            .filter(|d| *d <= input.day)
            .collect();
        let model = input
            .model
            .filter(|_| history_days.len() >= self.config.cold_start_days);
        let tier = if model.is_some() {
            RecommendationTier::Personalized
        } else {
            RecommendationTier::Default
        };
        debug!(
            user_id = %input.user_id,
            history_days = history_days.len(),
            ?tier,
            "ranking candidates"
        );

        let mut items: Vec<RecommendedFood> = candidates
            .into_values()
            .filter(|c| !self.is_excluded(c, &reactions, input.profile))
            .map(|candidate| {
                let key = normalize_food_name(&candidate.name);
                let exposure = exposures.get(&key);
                let penalty = self.recency_penalty(exposure, reported.get(&key).copied(), input.day);

                let mut rationale = Vec::new();
                let (base_score, multiplier) = match &model {
                    Some(model) => {
                        let base = model.score(&candidate.name, input.slot);
                        let multiplier = self.fusion_multiplier(
                            &candidate,
                            input.profile,
                            input.day,
                            &mut rationale,
                        );
                        if exposure.is_some_and(|e| e.times_eaten >= 2) {
                            rationale.push(RationaleTag::HistoricalFavorite);
                        }
                        if reactions.get(&key) == Some(&Reaction::Like) {
                            rationale.push(RationaleTag::LikedBefore);
                        }
                        if exposure.is_none() {
                            rationale.push(RationaleTag::NewToYou);
                        }
                        (base, multiplier)
                    }
                    None => {
                        rationale.push(RationaleTag::PopularDefault);
                        (candidate.popularity, 1.0)
                    }
                };
                if penalty > 0.0 {
                    rationale.push(RationaleTag::RecentlyEaten);
                }
                rationale.sort();

                RecommendedFood {
                    food_name: candidate.name,
                    score: base_score * multiplier - penalty,
                    base_score,
                    calories: candidate.calories,
                    category: candidate.category,
                    rationale,
                }
            })
            .collect();

        items.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.base_score.total_cmp(&a.base_score))
                .then_with(|| a.food_name.cmp(&b.food_name))
        });
        let combinations = match input.slot {
            Some(slot) => combine(
                slot,
                &items,
                self.config.daily_calorie_target * calorie_share(slot),
                self.config.max_combinations,
            ),
            None => Vec::new(),
        };
        items.truncate(self.config.max_recommendations);

        Recommendation {
            user_id: input.user_id,
            day: input.day,
            tier,
            model_version: model.as_ref().map(|m| m.version),
            items,
            combinations,
            generated_at: input.now,
        }
    }

    /// Catalog entries plus foods from the user's own history, keyed by normalized name.
    fn candidates(
        &self,
        catalog: &[FoodReference],
        history: &[MealRecord],
    ) -> BTreeMap<String, Candidate> {
        let mut candidates = BTreeMap::new();
        for food in catalog {
            let mut names = vec![normalize_food_name(&food.name)];
            names.extend(food.aliases.iter().map(|a| normalize_food_name(a)));
            candidates
                .entry(normalize_food_name(&food.name))
                .or_insert(Candidate {
                    name: food.name.clone(),
                    names,
                    calories: Some(food.calories),
                    category: Some(food.category),
                    tags: food.tags.clone(),
                    popularity: food.popularity,
                });
        }

        for record in history {
            if catalog.iter().any(|f| f.matches_name(&record.food_name)) {
                continue;
            }
            let key = normalize_food_name(&record.food_name);
            let candidate = candidates.entry(key.clone()).or_insert(Candidate {
                name: record.food_name.clone(),
                names: vec![key],
                calories: None,
                category: None,
                tags: Vec::new(),
                popularity: 0.0,
            });
            candidate.calories = Some(record.calories);
        }
        candidates
    }

    fn is_excluded(
        &self,
        candidate: &Candidate,
        reactions: &HashMap<String, Reaction>,
        profile: &UserProfile,
    ) -> bool {
        if candidate
            .names
            .iter()
            .any(|n| reactions.get(n) == Some(&Reaction::Dislike))
        {
            return true;
        }

        profile
            .questionnaire
            .dislikes
            .iter()
            .chain(profile.questionnaire.allergies.iter())
            .map(|term| normalize_food_name(term))
            .filter(|term| !term.is_empty())
            .any(|term| candidate.names.iter().any(|n| n.contains(&term)))
    }

    /// Days since each food was last reported as already eaten, within the recency window.
    fn reported_as_eaten(&self, feedback: &[Feedback], day: NaiveDate) -> HashMap<String, i64> {
        let mut reported: HashMap<String, i64> = HashMap::new();
        for f in feedback.iter().filter(|f| f.reaction == Reaction::AlreadyEaten) {
            let age = (day - f.created_at.date_naive()).num_days();
            if !(0..=self.config.recency_window_days).contains(&age) {
                continue;
            }
            let entry = reported
                .entry(normalize_food_name(&f.food_name))
                .or_insert(age);
            *entry = (*entry).min(age);
        }
        reported
    }

    /// A report of "already eaten" counts as an exposure on the day it was given.
    fn recency_penalty(
        &self,
        exposure: Option<&Exposure>,
        reported_age: Option<i64>,
        day: NaiveDate,
    ) -> f64 {
        let eaten_age = exposure
            .and_then(|e| e.last_day)
            .map(|last| (day - last).num_days());
        let age = match (eaten_age, reported_age) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        match age {
            Some(0) => self.config.eaten_today_penalty,
            Some(age) if age <= self.config.recency_window_days => self.config.recent_penalty,
            _ => 0.0,
        }
    }

    fn fusion_multiplier(
        &self,
        candidate: &Candidate,
        profile: &UserProfile,
        day: NaiveDate,
        rationale: &mut Vec<RationaleTag>,
    ) -> f64 {
        let mut multiplier = 1.0;

        if let Some(phase) = profile.phase_on(day) {
            let affinity = cycle_affinity(phase, &candidate.tags);
            if affinity > 0.0 {
                rationale.push(RationaleTag::CyclePhaseSupport);
            }
            multiplier *= factor(affinity);
        }

        if has_personality_signal(profile) {
            let affinity = personality_affinity(profile, &candidate.tags);
            if affinity > 0.0 {
                rationale.push(RationaleTag::PersonalityMatch);
            }
            multiplier *= factor(affinity);
        }

        multiplier
    }
}

/// How often and how recently each food was eaten up to `day`.
fn exposures(history: &[MealRecord], day: NaiveDate) -> HashMap<String, Exposure> {
    let mut exposures: HashMap<String, Exposure> = HashMap::new();
    for record in history.iter().filter(|r| r.day() <= day) {
        let exposure = exposures
            .entry(normalize_food_name(&record.food_name))
            .or_default();
        exposure.times_eaten += 1;
        exposure.last_day = exposure.last_day.max(Some(record.day()));
    }
    exposures
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::{
        feedback::entities::FeedbackConfig,
        food::entities::FoodCategory,
        meal::entities::{MealRecordConfig, Provenance},
        preference::entities::TrainingKind,
        profile::entities::CycleInfo,
    };

    fn food(name: &str, popularity: f64, tags: Vec<FoodTag>) -> FoodReference {
        FoodReference {
            id: name.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            calories: 100.0,
            category: FoodCategory::Staple,
            tags,
            popularity,
        }
    }

    fn catalog() -> Vec<FoodReference> {
        vec![
            food("fried chicken", 0.9, vec![FoodTag::Fried, FoodTag::Savory]),
            food("rice", 0.8, vec![]),
            food("spinach", 0.5, vec![FoodTag::Iron, FoodTag::Folate]),
            food("red dates", 0.4, vec![FoodTag::Iron, FoodTag::Sweet]),
            food("tofu", 0.3, vec![FoodTag::Protein]),
            food("banana", 0.6, vec![FoodTag::Magnesium, FoodTag::Sweet]),
        ]
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
    }

    fn record(user_id: Uuid, name: &str, days_before: i64) -> MealRecord {
        let at = Utc.from_utc_datetime(&day().and_hms_opt(12, 0, 0).unwrap())
            - Duration::days(days_before);
        MealRecord::new(MealRecordConfig {
            user_id,
            eaten_at: at,
            slot: MealSlot::Lunch,
            food_name: name.to_string(),
            calories: 100.0,
            provenance: Provenance::Manual,
        })
    }

    fn dislike(user_id: Uuid, name: &str) -> Feedback {
        Feedback::new(FeedbackConfig {
            user_id,
            food_name: name.to_string(),
            reaction: Reaction::Dislike,
        })
    }

    fn model(user_id: Uuid, weights: &[(&str, f64)]) -> Arc<PreferenceModel> {
        Arc::new(PreferenceModel {
            user_id,
            version: 7,
            kind: TrainingKind::Full,
            feature_weights: weights
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            idf: BTreeMap::new(),
            trained_on: 20,
            trained_at: Utc::now(),
        })
    }

    fn rank(
        history: &[MealRecord],
        feedback: &[Feedback],
        profile: &UserProfile,
        model: Option<Arc<PreferenceModel>>,
    ) -> Recommendation {
        let catalog = catalog();
        RecommendationEngine::new(RecommendationConfig::default()).rank(RankingInput {
            user_id: profile.user_id,
            day: day(),
            slot: None,
            catalog: &catalog,
            history,
            feedback,
            profile,
            model,
            now: Utc::now(),
        })
    }

    #[test]
    fn test_three_days_of_history_gets_default_tier() {
        let user = Uuid::new_v4();
        let history: Vec<_> = (1..=3).map(|d| record(user, "tofu", d)).collect();
        let profile = UserProfile::empty(user);

        let recommendation = rank(&history, &[], &profile, Some(model(user, &[])));
        assert_eq!(recommendation.tier, RecommendationTier::Default);
        assert_eq!(recommendation.model_version, None);
        assert!(
            recommendation
                .items
                .iter()
                .all(|i| i.rationale.contains(&RationaleTag::PopularDefault))
        );
        assert_eq!(recommendation.items[0].food_name, "fried chicken");
    }

    #[test]
    fn test_disliked_food_is_never_recommended() {
        let user = Uuid::new_v4();
        let history: Vec<_> = (1..=8).map(|d| record(user, "fried chicken", d)).collect();
        let feedback = vec![dislike(user, "Fried Chicken")];
        let profile = UserProfile::empty(user);

        let cold = rank(&history[..2], &feedback, &profile, None);
        let warm = rank(
            &history,
            &feedback,
            &profile,
            Some(model(user, &[("=fried chicken", 5.0), ("fried", 5.0)])),
        );

        for recommendation in [cold, warm] {
            assert!(
                recommendation
                    .items
                    .iter()
                    .all(|i| i.food_name != "fried chicken")
            );
        }
    }

    #[test]
    fn test_allergies_and_questionnaire_dislikes_are_excluded() {
        let user = Uuid::new_v4();
        let mut profile = UserProfile::empty(user);
        profile.questionnaire.allergies = vec!["Banana".to_string()];
        profile.questionnaire.dislikes = vec!["dates".to_string()];

        let recommendation = rank(&[], &[], &profile, None);
        let names: Vec<_> = recommendation.items.iter().map(|i| i.food_name.as_str()).collect();
        assert!(!names.contains(&"banana"));
        assert!(!names.contains(&"red dates"));
    }

    #[test]
    fn test_eaten_today_is_deprioritized_not_excluded() {
        let user = Uuid::new_v4();
        let mut history: Vec<_> = (1..=6).map(|d| record(user, "tofu", d)).collect();
        history.push(record(user, "rice", 0));
        let profile = UserProfile::empty(user);
        let model = model(user, &[("=rice", 1.0), ("rice", 1.0), ("=tofu", 1.0), ("tofu", 1.0)]);

        let recommendation = rank(&history, &[], &profile, Some(model));
        assert_eq!(recommendation.tier, RecommendationTier::Personalized);
        assert_eq!(recommendation.model_version, Some(7));

        let rice = recommendation.items.iter().find(|i| i.food_name == "rice").unwrap();
        let tofu = recommendation.items.iter().find(|i| i.food_name == "tofu").unwrap();
        assert_eq!(rice.base_score, tofu.base_score);
        assert!(rice.score < tofu.score);
        assert!(rice.rationale.contains(&RationaleTag::RecentlyEaten));
    }

    #[test]
    fn test_reported_as_eaten_today_gets_the_same_day_penalty() {
        let user = Uuid::new_v4();
        let history: Vec<_> = (1..=6).map(|d| record(user, "tofu", d)).collect();
        let mut eaten = Feedback::new(FeedbackConfig {
            user_id: user,
            food_name: "Rice".to_string(),
            reaction: Reaction::AlreadyEaten,
        });
        eaten.created_at = Utc.from_utc_datetime(&day().and_hms_opt(8, 0, 0).unwrap());
        let profile = UserProfile::empty(user);
        let model = model(user, &[("=rice", 1.0), ("rice", 1.0), ("=tofu", 1.0), ("tofu", 1.0)]);

        let recommendation = rank(&history, &[eaten], &profile, Some(model));
        let config = RecommendationConfig::default();
        let rice = recommendation.items.iter().find(|i| i.food_name == "rice").unwrap();
        let tofu = recommendation.items.iter().find(|i| i.food_name == "tofu").unwrap();
        assert!((rice.base_score - rice.score - config.eaten_today_penalty).abs() < 1e-9);
        assert!((tofu.base_score - tofu.score - config.recent_penalty).abs() < 1e-9);
        assert!(rice.rationale.contains(&RationaleTag::RecentlyEaten));
    }

    #[test]
    fn test_slot_request_assembles_meals_near_the_slot_budget() {
        let user = Uuid::new_v4();
        let categorized = |name: &str, category: FoodCategory, calories: f64| FoodReference {
            category,
            calories,
            ..food(name, 0.5, vec![])
        };
        let catalog = vec![
            categorized("rice", FoodCategory::Staple, 230.0),
            categorized("noodles", FoodCategory::Staple, 600.0),
            categorized("tofu", FoodCategory::Protein, 300.0),
            categorized("spinach", FoodCategory::Vegetable, 170.0),
            categorized("banana", FoodCategory::Fruit, 90.0),
        ];
        let profile = UserProfile::empty(user);
        let engine = RecommendationEngine::new(RecommendationConfig::default());
        let input = |slot| RankingInput {
            user_id: user,
            day: day(),
            slot,
            catalog: &catalog,
            history: &[],
            feedback: &[],
            profile: &profile,
            model: None,
            now: Utc::now(),
        };

        let lunch = engine.rank(input(Some(MealSlot::Lunch)));
        let best = &lunch.combinations[0];
        assert_eq!(best.calorie_target, 700.0);
        assert_eq!(best.food_names(), vec!["rice", "spinach", "tofu"]);
        assert_eq!(best.total_calories, 700.0);
        assert!(lunch.combinations.len() <= 3);

        assert!(engine.rank(input(None)).combinations.is_empty());
    }

    #[test]
    fn test_cycle_phase_fusion_lifts_supporting_foods() {
        let user = Uuid::new_v4();
        let history: Vec<_> = (1..=6).map(|d| record(user, "noodles", d + 10)).collect();
        let mut profile = UserProfile::empty(user);
        profile.cycle = Some(CycleInfo {
            last_period_start: day() - Duration::days(1),
            cycle_length_days: 28,
        });

        let recommendation = rank(&history, &[], &profile, Some(model(user, &[])));
        let spinach = recommendation.items.iter().find(|i| i.food_name == "spinach").unwrap();
        assert!(spinach.score > spinach.base_score);
        assert!(spinach.score <= spinach.base_score * 1.2 + 1e-9);
        assert!(spinach.rationale.contains(&RationaleTag::CyclePhaseSupport));
        assert!(
            recommendation
                .items
                .iter()
                .all(|i| i.food_name != "fried chicken")
        );
    }

    #[test]
    fn test_ranking_is_deterministic_with_alphabetical_tie_break() {
        let user = Uuid::new_v4();
        let history: Vec<_> = (1..=6).map(|d| record(user, "noodles", d + 10)).collect();
        let profile = UserProfile::empty(user);

        let first = rank(&history, &[], &profile, Some(model(user, &[])));
        let second = rank(&history, &[], &profile, Some(model(user, &[])));
        let names: Vec<_> = first.items.iter().map(|i| i.food_name.clone()).collect();

        assert_eq!(
            names,
            second.items.iter().map(|i| i.food_name.clone()).collect::<Vec<_>>()
        );
        assert_eq!(names, vec!["banana", "fried chicken", "noodles", "red dates", "rice"]);
    }
}
