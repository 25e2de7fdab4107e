use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{
    advisory::entities::{AdvisoryResponse, NutritionSummary, SlotSummary},
    common::entities::app_errors::CoreError,
    meal::entities::{MealRecord, MealSlot},
    profile::entities::UserProfile,
};

/// Summarizes the records of `day`, slots in breakfast-to-snack order.
pub fn summarize_day(records: &[MealRecord], day: NaiveDate) -> NutritionSummary {
    let mut slots: BTreeMap<MealSlot, SlotSummary> = BTreeMap::new();
    let mut record_count = 0;

    for record in records.iter().filter(|r| r.day() == day) {
        record_count += 1;
        let slot = slots.entry(record.slot).or_insert_with(|| SlotSummary {
            slot: record.slot,
            calories: 0.0,
            foods: Vec::new(),
        });
        slot.calories += record.calories;
        slot.foods.push(record.food_name.clone());
    }

    let slots: Vec<SlotSummary> = slots.into_values().collect();
    NutritionSummary {
        day,
        total_calories: slots.iter().map(|s| s.calories).sum(),
        record_count,
        slots,
    }
}

pub fn build_advisory_prompt(summary: &NutritionSummary, profile: &UserProfile) -> String {
    let mut prompt = format!(
        "You are a nutrition assistant. Review the meals recorded on {} and give a short \
         analysis and up to three concrete suggestions for the next day.\n\n",
        summary.day
    );

    prompt.push_str(&format!(
        "Total: {:.0} kcal over {} items.\n",
        summary.total_calories, summary.record_count
    ));
    for slot in &summary.slots {
        prompt.push_str(&format!(
            "- {}: {:.0} kcal ({})\n",
            slot.slot.as_str(),
            slot.calories,
            slot.foods.join(", ")
        ));
    }

    if let Some(phase) = profile.phase_on(summary.day) {
        prompt.push_str(&format!("\nCycle phase: {:?}\n", phase));
    }
    let questionnaire = &profile.questionnaire;
    if !questionnaire.allergies.is_empty() {
        prompt.push_str(&format!("Allergies: {}\n", questionnaire.allergies.join(", ")));
    }
    if !questionnaire.dislikes.is_empty() {
        prompt.push_str(&format!("Dislikes: {}\n", questionnaire.dislikes.join(", ")));
    }
    if let Some(notes) = &questionnaire.notes {
        prompt.push_str(&format!("Notes: {}\n", notes));
    }

    prompt
}

pub fn parse_advisory_response(text: &str) -> Result<AdvisoryResponse, CoreError> {
    serde_json::from_str(text.trim()).map_err(|e| {
        CoreError::ExternalServiceError(format!("Failed to parse advisory response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::meal::entities::{MealRecordConfig, Provenance};

    fn record(day: u32, slot: MealSlot, name: &str, calories: f64) -> MealRecord {
        MealRecord::new(MealRecordConfig {
            user_id: Uuid::nil(),
            eaten_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
            slot,
            food_name: name.to_string(),
            calories,
            provenance: Provenance::Manual,
        })
    }

    #[test]
    fn test_summary_only_counts_the_requested_day() {
        let records = vec![
            record(20, MealSlot::Dinner, "noodles", 450.0),
            record(20, MealSlot::Breakfast, "oatmeal", 150.0),
            record(20, MealSlot::Breakfast, "milk", 60.0),
            record(19, MealSlot::Lunch, "rice", 130.0),
        ];
        let day = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let summary = summarize_day(&records, day);

        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.total_calories, 660.0);
        assert_eq!(summary.slots.len(), 2);
        assert_eq!(summary.slots[0].slot, MealSlot::Breakfast);
        assert_eq!(summary.slots[0].foods, vec!["oatmeal", "milk"]);
    }

    #[test]
    fn test_prompt_mentions_allergies() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let summary = summarize_day(&[record(20, MealSlot::Lunch, "rice", 130.0)], day);
        let mut profile = UserProfile::empty(Uuid::nil());
        profile.questionnaire.allergies = vec!["peanut".to_string()];

        let prompt = build_advisory_prompt(&summary, &profile);
        assert!(prompt.contains("lunch: 130 kcal (rice)"));
        assert!(prompt.contains("Allergies: peanut"));
    }

    #[test]
    fn test_parse_response() {
        let parsed =
            parse_advisory_response(r#"{"analysis": "balanced", "suggestions": ["more fiber"]}"#)
                .unwrap();
        assert_eq!(parsed.analysis, "balanced");
        assert_eq!(parsed.suggestions, vec!["more fiber"]);

        assert!(matches!(
            parse_advisory_response("not json"),
            Err(CoreError::ExternalServiceError(_))
        ));
    }
}
