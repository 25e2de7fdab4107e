use std::ops::Range;

use regex::Regex;
use tracing::{debug, error};

use crate::domain::{
    common::entities::app_errors::CoreError,
    recognition::entities::{BackendOutput, RecognitionCandidate},
};

const KJ_PER_KCAL: f64 = 4.184;
const MAX_NAME_CHARS: usize = 64;

const VALUE_UNIT_PATTERN: &str = r"(?i)(?P<sign>-)?(?P<value>\d+(?:[.,]\d+)?)\s*(?P<unit>kilocalories|kilocalorie|kcal|calories|calorie|cals|cal|kj|千卡|大卡|卡路里|卡)";
const LABEL_VALUE_PATTERN: &str = r"(?i)(?:calories|calorie|energy|热量|能量|卡路里)\s*[:：]?\s*(?P<sign>-)?(?P<value>\d+(?:[.,]\d+)?)\s*(?P<unit>kcal|cal|kj|千卡|大卡|卡)?";
const NOISE_PATTERN: &str = r"(?i)\bper\s*\d+\s*(?:g|ml)\b|每\s*\d+\s*(?:g|ml|克|毫升)|\b(?:calories|calorie|energy|nutrition facts)\b|热量|能量|卡路里";

/// Structured candidates recovered from raw backend text plus the number of fragments that
/// could not be turned into a plausible (name, calories) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    pub candidates: Vec<RecognitionCandidate>,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum LineParse {
    Blank,
    Pair { name: Option<String>, calories: f64 },
    NameOnly(String),
    Unusable,
}

pub struct CandidateNormalizer {
    value_unit: Regex,
    label_value: Regex,
    noise: Regex,
}

impl CandidateNormalizer {
    pub fn new() -> Result<Self, CoreError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                error!("Failed to compile normalizer pattern: {}", e);
                CoreError::InternalServerError
            })
        };

        Ok(Self {
            value_unit: compile(VALUE_UNIT_PATTERN)?,
            label_value: compile(LABEL_VALUE_PATTERN)?,
            noise: compile(NOISE_PATTERN)?,
        })
    }

    pub fn normalize(&self, outputs: &[BackendOutput]) -> NormalizationReport {
        let mut report = NormalizationReport::default();

        for output in outputs {
            for candidate in &output.candidates {
                let fragment = self.normalize_candidate(candidate);
                report.candidates.extend(fragment.candidates);
                report.dropped += fragment.dropped;
            }
        }

        if report.dropped > 0 {
            debug!(
                dropped = report.dropped,
                kept = report.candidates.len(),
                "dropped unparsable recognizer fragments"
            );
        }
        report
    }

    /// Splits one raw fragment into lines and parses each line. A line holding only a value
    /// borrows its name from the closest preceding name-only line.
    pub fn normalize_candidate(&self, candidate: &RecognitionCandidate) -> NormalizationReport {
        let mut report = NormalizationReport::default();

        if let (Some(name), Some(calories)) = (&candidate.food_name, candidate.calories) {
            match self.clean_name(name) {
                Some(name) if is_plausible_calories(calories) => report
                    .candidates
                    .push(candidate.with_parsed(&candidate.raw_text, name, calories)),
                _ => report.dropped += 1,
            }
            return report;
        }

        let mut pending_name: Option<String> = None;

        for line in candidate.raw_text.lines() {
            match self.parse_line(line) {
                LineParse::Blank => {}
                LineParse::Unusable => report.dropped += 1,
                LineParse::NameOnly(name) => {
                    if pending_name.replace(name).is_some() {
                        report.dropped += 1;
                    }
                }
                LineParse::Pair { name, calories } => match name.or_else(|| pending_name.take()) {
                    Some(name) => report
                        .candidates
                        .push(candidate.with_parsed(line.trim(), name, calories)),
                    None => report.dropped += 1,
                },
            }
        }

        if pending_name.is_some() {
            report.dropped += 1;
        }
        report
    }

    fn parse_line(&self, line: &str) -> LineParse {
        let text = localize_digits(line);
        let text = text.trim();
        if text.is_empty() {
            return LineParse::Blank;
        }

        if let Some((span, calories)) = self.find_calories(text) {
            if !is_plausible_calories(calories) {
                return LineParse::Unusable;
            }
            let rest = format!("{} {}", &text[..span.start], &text[span.end..]);
            return LineParse::Pair {
                name: self.clean_name(&rest),
                calories,
            };
        }

        match self.clean_name(text) {
            Some(name) => LineParse::NameOnly(name),
            None => LineParse::Unusable,
        }
    }

    /// Byte span of the calorie expression and its value in kcal (negative when signed).
    fn find_calories(&self, text: &str) -> Option<(Range<usize>, f64)> {
        for caps in self.value_unit.captures_iter(text) {
            let (Some(whole), Some(value), Some(unit)) =
                (caps.get(0), caps.name("value"), caps.name("unit"))
            else {
                continue;
            };

            // "100 calcium" is not a calorie value
            let unit_is_latin = unit.as_str().is_ascii();
            let followed_by_letter = text[unit.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic());
            if unit_is_latin && followed_by_letter {
                continue;
            }

            if let Some(v) = parse_value(value.as_str()) {
                let signed = if caps.name("sign").is_some() { -v } else { v };
                return Some((whole.range(), to_kcal(signed, unit.as_str())));
            }
        }

        let caps = self.label_value.captures(text)?;
        let whole = caps.get(0)?;
        let value = parse_value(caps.name("value")?.as_str())?;
        let signed = if caps.name("sign").is_some() {
            -value
        } else {
            value
        };
        let unit = caps.name("unit").map(|u| u.as_str()).unwrap_or("kcal");

        Some((whole.range(), to_kcal(signed, unit)))
    }

    fn clean_name(&self, raw: &str) -> Option<String> {
        let without_noise = self.noise.replace_all(raw, " ");
        let collapsed = without_noise.split_whitespace().collect::<Vec<_>>().join(" ");
        let trimmed = collapsed
            .trim_matches(|c: char| {
                c.is_whitespace() || c.is_ascii_punctuation() || "：，；（）【】·、。".contains(c)
            })
            .to_string();

        if trimmed.is_empty()
            || trimmed.chars().count() > MAX_NAME_CHARS
            || !trimmed.chars().any(char::is_alphabetic)
        {
            return None;
        }
        Some(trimmed)
    }
}

fn is_plausible_calories(calories: f64) -> bool {
    calories.is_finite() && calories >= 0.0
}

fn to_kcal(value: f64, unit: &str) -> f64 {
    let kcal = if unit.eq_ignore_ascii_case("kj") {
        value / KJ_PER_KCAL
    } else {
        value
    };
    (kcal * 10.0).round() / 10.0
}

/// Accepts a decimal point, a decimal comma and a single thousands comma ("1,200").
fn parse_value(raw: &str) -> Option<f64> {
    let normalized = match raw.split_once(',') {
        Some((int, frac)) if frac.len() == 3 => format!("{}{}", int, frac),
        Some((int, frac)) => format!("{}.{}", int, frac),
        None => raw.to_string(),
    };
    normalized.parse::<f64>().ok()
}

/// Maps full-width and Arabic-Indic digits (and their separators) to ASCII.
pub fn localize_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '．' | '\u{066B}' => '.',
            '，' | '\u{066C}' => ',',
            '：' => ':',
            '－' | '−' => '-',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recognition::entities::{BackendId, BackendStatus, RegionLocator};

    fn raw(text: &str) -> RecognitionCandidate {
        RecognitionCandidate::raw(
            BackendId::new("ocr"),
            text,
            RegionLocator::whole_image(),
            0.7,
        )
    }

    fn parse(text: &str) -> NormalizationReport {
        CandidateNormalizer::new()
            .unwrap()
            .normalize_candidate(&raw(text))
    }

    fn pairs(report: &NormalizationReport) -> Vec<(String, f64)> {
        report
            .candidates
            .iter()
            .map(|c| (c.food_name.clone().unwrap(), c.calories.unwrap()))
            .collect()
    }

    #[test]
    fn test_unit_variants() {
        assert_eq!(pairs(&parse("Apple 52 kcal")), vec![("Apple".to_string(), 52.0)]);
        assert_eq!(pairs(&parse("Apple 52Cal")), vec![("Apple".to_string(), 52.0)]);
        assert_eq!(
            pairs(&parse("Banana - 89 calories")),
            vec![("Banana".to_string(), 89.0)]
        );
        assert_eq!(pairs(&parse("苹果 52千卡")), vec![("苹果".to_string(), 52.0)]);
        assert_eq!(pairs(&parse("米饭：130大卡")), vec![("米饭".to_string(), 130.0)]);
    }

    #[test]
    fn test_kilojoules_are_converted() {
        let report = parse("Oat bar 1,200 kJ");
        assert_eq!(pairs(&report), vec![("Oat bar".to_string(), 286.8)]);
    }

    #[test]
    fn test_localized_digits_and_decimal_comma() {
        assert_eq!(pairs(&parse("香蕉 ８９ 千卡")), vec![("香蕉".to_string(), 89.0)]);
        assert_eq!(
            pairs(&parse("Yogurt \u{0665}\u{0669} kcal")),
            vec![("Yogurt".to_string(), 59.0)]
        );
        assert_eq!(pairs(&parse("Soup 45,5 cal")), vec![("Soup".to_string(), 45.5)]);
    }

    #[test]
    fn test_value_line_borrows_preceding_name() {
        let report = parse("Nutrition Facts\nApple\nCalories: 95");
        assert_eq!(pairs(&report), vec![("Apple".to_string(), 95.0)]);
        // the header line carries neither a name nor a value
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn test_name_then_value_lines() {
        let report = parse("Banana\n89 kcal");
        assert_eq!(pairs(&report), vec![("Banana".to_string(), 89.0)]);
    }

    #[test]
    fn test_implausible_fragments_are_counted() {
        let report = parse("Chips -20 kcal\n52 kcal\nbest before 2025\n100 calcium");
        assert!(report.candidates.is_empty());
        assert_eq!(report.dropped, 4);
    }

    #[test]
    fn test_normalize_collects_all_backends() {
        let normalizer = CandidateNormalizer::new().unwrap();
        let outputs = vec![
            BackendOutput {
                backend: BackendId::new("a"),
                status: BackendStatus::Ok,
                candidates: vec![raw("apple 95 kcal"), raw("###")],
                elapsed_ms: 3,
            },
            BackendOutput {
                backend: BackendId::new("b"),
                status: BackendStatus::TimedOut,
                candidates: Vec::new(),
                elapsed_ms: 100,
            },
        ];
        let report = normalizer.normalize(&outputs);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn test_pre_parsed_candidates_pass_through() {
        let mut candidate = raw("apple");
        candidate.food_name = Some(" apple ".to_string());
        candidate.calories = Some(52.0);
        let report = CandidateNormalizer::new()
            .unwrap()
            .normalize_candidate(&candidate);
        assert_eq!(pairs(&report), vec![("apple".to_string(), 52.0)]);
    }
}
