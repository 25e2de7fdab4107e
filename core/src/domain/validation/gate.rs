use chrono::Utc;
use tracing::info;

use crate::domain::{
    common::{ValidationConfig, entities::app_errors::CoreError},
    food::helpers::normalize_food_name,
    meal::entities::{MealRecord, MealRecordConfig, Provenance},
    recognition::entities::MergedCandidate,
    validation::entities::{
        Correction, CorrectionConfig, GateOutcome, Region, RegionState, Resolution, UserChoice,
    },
};

/// Finite-state machine deciding the fate of every detected region.
///
/// ```text
/// Pending ──auto──▶ Accepted | Rejected | AwaitingUser
/// AwaitingUser ──resolve / expire──▶ Accepted | Rejected
/// ```
pub struct ValidationGate {
    config: ValidationConfig,
}

impl ValidationGate {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, region: &mut Region) -> Result<GateOutcome, CoreError> {
        if region.state != RegionState::Pending {
            return Err(CoreError::InvalidInput(format!(
                "region {} is not pending",
                region.id
            )));
        }

        let Some(top) = region.candidates.first() else {
            region.state = RegionState::AwaitingUser;
            return Ok(GateOutcome::AwaitingUser);
        };

        let supported = top.database_match.is_some() || top.user_confirmed;
        if top.merged_confidence >= self.config.high_threshold && supported {
            let record = accepted_record(region, &top.food_name, top.calories, Provenance::OcrConfirmed);
            finish(region, RegionState::Accepted);
            return Ok(GateOutcome::Accepted(record));
        }

        let no_database_support = region
            .candidates
            .iter()
            .all(|c| c.database_match.is_none());
        if top.merged_confidence < self.config.low_threshold && no_database_support {
            let reason = format!(
                "best candidate '{}' at {:.2} is below {:.2} with no database match",
                top.food_name, top.merged_confidence, self.config.low_threshold
            );
            info!(region_id = %region.id, reason = %reason, "region rejected");
            finish(region, RegionState::Rejected);
            return Ok(GateOutcome::Rejected { reason });
        }

        self.defer(region);
        Ok(GateOutcome::AwaitingUser)
    }

    /// Hands the region to the user with the top suggestions.
    pub fn defer(&self, region: &mut Region) {
        region.candidates.truncate(self.config.top_k.max(1));
        region.state = RegionState::AwaitingUser;
    }

    pub fn resolve(
        &self,
        region: &mut Region,
        choice: Option<UserChoice>,
    ) -> Result<Resolution, CoreError> {
        match region.state {
            RegionState::Accepted | RegionState::Rejected => {
                return Err(CoreError::RegionAlreadyResolved(region.id));
            }
            RegionState::Pending => return Err(CoreError::RegionNotAwaitingUser(region.id)),
            RegionState::AwaitingUser => {}
        }

        let Some(choice) = choice else {
            info!(region_id = %region.id, "region rejected by user");
            finish(region, RegionState::Rejected);
            return Ok(Resolution::Rejected);
        };

        let (name, calories, chosen_top) = match choice {
            UserChoice::Confirm { rank } => {
                let picked = region.candidates.get(rank).ok_or_else(|| {
                    CoreError::InvalidInput(format!("no suggestion at rank {}", rank))
                })?;
                (picked.food_name.clone(), picked.calories, rank == 0)
            }
            UserChoice::Edit {
                food_name,
                calories,
            } => {
                let food_name = food_name.trim().to_string();
                if food_name.is_empty() || !calories.is_finite() || calories < 0.0 {
                    return Err(CoreError::InvalidInput(
                        "a food name and a non-negative calorie value are required".to_string(),
                    ));
                }
                let same_as_top = region
                    .candidates
                    .first()
                    .is_some_and(|top| same_choice(top, &food_name, calories));
                (food_name, calories, same_as_top)
            }
        };

        let (provenance, correction) = match region.candidates.first() {
            None => (Provenance::Manual, None),
            Some(_) if chosen_top => (Provenance::OcrConfirmed, None),
            Some(top) => (
                Provenance::OcrCorrected,
                Some(Correction::new(CorrectionConfig {
                    region_id: region.id,
                    user_id: region.user_id,
                    original: top.clone(),
                    proposals: region.proposals.clone(),
                    accepted_name: name.clone(),
                    accepted_calories: calories,
                })),
            ),
        };

        let record = accepted_record(region, &name, calories, provenance);
        finish(region, RegionState::Accepted);
        Ok(Resolution::Accepted { record, correction })
    }

    /// Closes a region nobody resolved in time.
    pub fn expire(&self, region: &mut Region) -> Result<(), CoreError> {
        if region.state.is_terminal() {
            return Err(CoreError::RegionAlreadyResolved(region.id));
        }
        info!(region_id = %region.id, "region expired without resolution");
        finish(region, RegionState::Rejected);
        Ok(())
    }
}

fn same_choice(top: &MergedCandidate, name: &str, calories: f64) -> bool {
    normalize_food_name(&top.food_name) == normalize_food_name(name)
        && (top.calories - calories).abs() < 0.5
}

fn accepted_record(
    region: &Region,
    food_name: &str,
    calories: f64,
    provenance: Provenance,
) -> MealRecord {
    MealRecord::new(MealRecordConfig {
        user_id: region.user_id,
        eaten_at: region.eaten_at,
        slot: region.slot,
        food_name: food_name.to_string(),
        calories,
        provenance,
    })
}

fn finish(region: &mut Region, state: RegionState) {
    region.state = state;
    region.candidates.clear();
    region.proposals.clear();
    region.resolved_at = Some(Utc::now());
}
