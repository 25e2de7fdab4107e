use tracing::{instrument, warn};

use crate::domain::{
    advisory::{
        entities::{AdvisoryReport, AdvisoryStatus},
        helpers::{build_advisory_prompt, parse_advisory_response, summarize_day},
        ports::{AdvisoryService, LLMClient},
        schema::get_advisory_schema,
        value_objects::DailyAdvisoryInput,
    },
    common::{entities::app_errors::CoreError, generate_timestamp, services::Service},
    feedback::ports::FeedbackRepository,
    food::ports::FoodReferenceDatabase,
    learning::ports::CorrectionRepository,
    meal::ports::MealRecordRepository,
    preference::ports::PreferenceModelRepository,
    profile::{entities::UserProfile, ports::UserProfileRepository},
};

impl<M, F, P, CA, PM, D, LLM> AdvisoryService for Service<M, F, P, CA, PM, D, LLM>
where
    M: MealRecordRepository,
    F: FeedbackRepository,
    P: UserProfileRepository,
    CA: CorrectionRepository,
    PM: PreferenceModelRepository,
    D: FoodReferenceDatabase,
    LLM: LLMClient,
{
    #[instrument(skip(self, input), fields(user_id = %input.user_id, day = %input.day))]
    async fn daily_advisory(&self, input: DailyAdvisoryInput) -> Result<AdvisoryReport, CoreError> {
        let records = self.meal_repository.list_by_user(input.user_id).await?;
        let summary = summarize_day(&records, input.day);

        let advisory = if summary.record_count == 0 {
            AdvisoryStatus::Unavailable {
                reason: "no meals recorded for this day".to_string(),
            }
        } else {
            let profile = self
                .profile_repository
                .get(input.user_id)
                .await?
                .unwrap_or_else(|| UserProfile::empty(input.user_id));
            let prompt = build_advisory_prompt(&summary, &profile);

            match self
                .llm_client
                .generate_with_text(prompt, get_advisory_schema())
                .await
                .and_then(|raw| parse_advisory_response(&raw))
            {
                Ok(response) => AdvisoryStatus::Available {
                    analysis: response.analysis,
                    suggestions: response.suggestions,
                },
                Err(e) => {
                    warn!("advisory unavailable: {}", e);
                    AdvisoryStatus::Unavailable {
                        reason: e.to_string(),
                    }
                }
            }
        };

        Ok(AdvisoryReport {
            user_id: input.user_id,
            day: input.day,
            summary,
            advisory,
            generated_at: generate_timestamp().0,
        })
    }
}
