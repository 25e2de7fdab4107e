//! Auxiliary-factor fusion: bounded multipliers derived from the profile.
//!
//! Each factor is `1 + 0.2 * affinity` with the affinity clamped to [-1, 1], so a
//! factor always lies in [0.8, 1.2]. Affinities only grow with the number of matching
//! tags on a food.

use crate::domain::{
    food::entities::FoodTag,
    profile::entities::{CyclePhase, Element, PersonalityTag, UserProfile},
};

pub const FACTOR_SPREAD: f64 = 0.2;

const TAG_STEP: f64 = 0.5;
const FLAVOR_STEP: f64 = 0.25;
const TASTE_STEP: f64 = 0.5;

pub fn factor(affinity: f64) -> f64 {
    1.0 + FACTOR_SPREAD * affinity.clamp(-1.0, 1.0)
}

/// Nutrients worth favoring during a phase, and tags worth avoiding.
pub fn phase_tags(phase: CyclePhase) -> (&'static [FoodTag], &'static [FoodTag]) {
    match phase {
        CyclePhase::Menstrual => (
            &[FoodTag::Iron, FoodTag::Protein, FoodTag::VitaminC],
            &[FoodTag::Fried, FoodTag::Sour],
        ),
        CyclePhase::Follicular => (
            &[FoodTag::Protein, FoodTag::VitaminB, FoodTag::Folate],
            &[FoodTag::Fried],
        ),
        CyclePhase::Ovulation => (
            &[FoodTag::Zinc, FoodTag::Fiber, FoodTag::VitaminC],
            &[FoodTag::Fried],
        ),
        CyclePhase::Luteal => (
            &[
                FoodTag::Magnesium,
                FoodTag::Calcium,
                FoodTag::Fiber,
                FoodTag::VitaminB,
            ],
            &[FoodTag::Sweet, FoodTag::Fried],
        ),
    }
}

pub fn cycle_affinity(phase: CyclePhase, tags: &[FoodTag]) -> f64 {
    let (supported, discouraged) = phase_tags(phase);
    let hits = tags.iter().filter(|t| supported.contains(t)).count() as f64;
    let misses = tags.iter().filter(|t| discouraged.contains(t)).count() as f64;
    (TAG_STEP * hits - TAG_STEP * misses).clamp(-1.0, 1.0)
}

fn element_flavor(element: Element) -> FoodTag {
    match element {
        Element::Fire => FoodTag::Spicy,
        Element::Earth => FoodTag::Savory,
        Element::Air => FoodTag::Light,
        Element::Water => FoodTag::Sweet,
    }
}

fn trait_flavor(tag: PersonalityTag) -> Option<FoodTag> {
    match tag {
        PersonalityTag::Adventurous => Some(FoodTag::Spicy),
        PersonalityTag::Innovative => Some(FoodTag::Sour),
        PersonalityTag::Conservative | PersonalityTag::Traditional => Some(FoodTag::Savory),
        PersonalityTag::Introvert => Some(FoodTag::Light),
        PersonalityTag::Emotional => Some(FoodTag::Sweet),
        PersonalityTag::Extrovert | PersonalityTag::Rational => None,
    }
}

/// Affinity from zodiac element, personality traits and the questionnaire taste.
///
/// The stated taste counts for more than the static tags and penalizes foods whose
/// flavor is a different one.
pub fn personality_affinity(profile: &UserProfile, tags: &[FoodTag]) -> f64 {
    let mut flavors: Vec<FoodTag> = profile
        .personality
        .iter()
        .filter_map(|t| trait_flavor(*t))
        .collect();
    if let Some(zodiac) = profile.zodiac {
        flavors.push(element_flavor(zodiac.element()));
    }

    let mut affinity = flavors
        .iter()
        .filter(|flavor| tags.contains(flavor))
        .count() as f64
        * FLAVOR_STEP;

    if let Some(taste) = profile.questionnaire.taste {
        let wanted = taste.tag();
        if tags.contains(&wanted) {
            affinity += TASTE_STEP;
        } else if tags.iter().any(|t| t.is_flavor()) {
            affinity -= TASTE_STEP;
        }
    }

    affinity.clamp(-1.0, 1.0)
}

pub fn has_personality_signal(profile: &UserProfile) -> bool {
    profile.zodiac.is_some()
        || !profile.personality.is_empty()
        || profile.questionnaire.taste.is_some()
}
