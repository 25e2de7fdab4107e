use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::food::FoodTag;

pub const DEFAULT_CYCLE_LENGTH_DAYS: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CycleInfo {
    pub last_period_start: NaiveDate,
    pub cycle_length_days: u32,
}

impl CycleInfo {
    pub fn phase_on(&self, day: NaiveDate) -> CyclePhase {
        let length = if self.cycle_length_days == 0 {
            DEFAULT_CYCLE_LENGTH_DAYS
        } else {
            self.cycle_length_days
        } as i64;
        let offset = (day - self.last_period_start).num_days().rem_euclid(length);

        match offset {
            0..=4 => CyclePhase::Menstrual,
            5..=13 => CyclePhase::Follicular,
            14..=17 => CyclePhase::Ovulation,
            _ => CyclePhase::Luteal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTag {
    Extrovert,
    Introvert,
    Rational,
    Emotional,
    Adventurous,
    Conservative,
    Innovative,
    Traditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

impl ZodiacSign {
    pub fn element(&self) -> Element {
        match self {
            ZodiacSign::Aries | ZodiacSign::Leo | ZodiacSign::Sagittarius => Element::Fire,
            ZodiacSign::Taurus | ZodiacSign::Virgo | ZodiacSign::Capricorn => Element::Earth,
            ZodiacSign::Gemini | ZodiacSign::Libra | ZodiacSign::Aquarius => Element::Air,
            ZodiacSign::Cancer | ZodiacSign::Scorpio | ZodiacSign::Pisces => Element::Water,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TastePreference {
    Sweet,
    Spicy,
    Light,
    Savory,
    Sour,
}

impl TastePreference {
    pub fn tag(&self) -> FoodTag {
        match self {
            TastePreference::Sweet => FoodTag::Sweet,
            TastePreference::Spicy => FoodTag::Spicy,
            TastePreference::Light => FoodTag::Light,
            TastePreference::Savory => FoodTag::Savory,
            TastePreference::Sour => FoodTag::Sour,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Questionnaire {
    pub taste: Option<TastePreference>,
    pub dislikes: Vec<String>,
    pub allergies: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub cycle: Option<CycleInfo>,
    pub zodiac: Option<ZodiacSign>,
    pub personality: Vec<PersonalityTag>,
    pub questionnaire: Questionnaire,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            cycle: None,
            zodiac: None,
            personality: Vec::new(),
            questionnaire: Questionnaire::default(),
            updated_at: Utc::now(),
        }
    }

    pub fn phase_on(&self, day: NaiveDate) -> Option<CyclePhase> {
        self.cycle.as_ref().map(|c| c.phase_on(day))
    }
}
