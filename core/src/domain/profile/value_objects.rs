use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::profile::entities::{CycleInfo, PersonalityTag, Questionnaire, ZodiacSign};

/// Explicit profile update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileInput {
    pub user_id: Uuid,
    pub cycle: Option<CycleInfo>,
    pub zodiac: Option<ZodiacSign>,
    pub personality: Option<Vec<PersonalityTag>>,
    pub questionnaire: Option<Questionnaire>,
}
