use std::collections::HashMap;

use crate::domain::{
    feedback::entities::{Feedback, Reaction},
    food::helpers::normalize_food_name,
};

/// Latest reaction per normalized food name. Later feedback overrides earlier feedback.
pub fn latest_reactions(feedback: &[Feedback]) -> HashMap<String, Reaction> {
    let mut ordered: Vec<&Feedback> = feedback.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut latest = HashMap::new();
    for entry in ordered {
        if entry.reaction == Reaction::AlreadyEaten {
            continue;
        }
        latest.insert(normalize_food_name(&entry.food_name), entry.reaction);
    }
    latest
}
