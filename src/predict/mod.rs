//! Outcome lookup for a new stop.
//!
//! This is not a trained model. Historical stops that match the new one on
//! all nine form fields are collected, and the most frequent violation and
//! outcome among them are reported. With no match the answer is a fixed
//! default.

mod summary;

pub use summary::{NewStopLog, PredictionSummary};

use crate::stops::{Gender, StopRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Violation reported when no historical stop matches.
pub const DEFAULT_VIOLATION: &str = "Speeding";

/// Outcome reported when no historical stop matches.
pub const DEFAULT_OUTCOME: &str = "Warning";

/// The nine fields a historical stop must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopQuery {
    pub driver_gender: Gender,
    pub driver_age: i64,
    pub stop_duration: String,
    pub search_conducted: bool,
    pub drugs_related_stop: bool,
    pub country_name: String,
    pub driver_race: String,
    pub vehicle_number: String,
    pub search_type: String,
}

impl StopQuery {
    /// Returns true if `record` agrees with every field.
    pub fn matches(&self, record: &StopRecord) -> bool {
        record.driver_gender == self.driver_gender.as_str()
            && record.driver_age == Some(self.driver_age)
            && record.stop_duration == self.stop_duration
            && record.search_conducted == self.search_conducted
            && record.drugs_related_stop == self.drugs_related_stop
            && record.country_name == self.country_name
            && record.driver_race == self.driver_race
            && record.vehicle_number == self.vehicle_number
            && record.search_type == self.search_type
    }
}

/// Whether a prediction came from matching stops or from the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Matched,
    Default,
}

/// Predicted violation and stop outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub violation: String,
    pub outcome: String,
    /// Number of historical stops that matched.
    pub matched_rows: usize,
    pub source: PredictionSource,
}

impl Prediction {
    fn fallback() -> Self {
        Self {
            violation: DEFAULT_VIOLATION.to_string(),
            outcome: DEFAULT_OUTCOME.to_string(),
            matched_rows: 0,
            source: PredictionSource::Default,
        }
    }
}

/// Predicts violation and outcome for `query` from the historical `records`.
///
/// Violation and outcome are the modes of the matching stops, taken
/// independently. Ties go to the lexicographically smallest value.
pub fn predict(records: &[StopRecord], query: &StopQuery) -> Prediction {
    let matching: Vec<&StopRecord> = records.iter().filter(|r| query.matches(r)).collect();

    let violation = mode(matching.iter().map(|r| r.violation.as_str()));
    let outcome = mode(matching.iter().map(|r| r.stop_outcome.as_str()));

    match (violation, outcome) {
        (Some(violation), Some(outcome)) => Prediction {
            violation: violation.to_string(),
            outcome: outcome.to_string(),
            matched_rows: matching.len(),
            source: PredictionSource::Matched,
        },
        _ => Prediction::fallback(),
    }
}

/// Most frequent value, smallest first on ties. `None` for no values.
pub fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    // BTreeMap iterates in ascending order, so the first maximum is the smallest
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn query() -> StopQuery {
        StopQuery {
            driver_gender: Gender::Male,
            driver_age: 30,
            stop_duration: "0".to_string(),
            search_conducted: false,
            drugs_related_stop: false,
            country_name: "USA".to_string(),
            driver_race: "White".to_string(),
            vehicle_number: "AB123".to_string(),
            search_type: String::new(),
        }
    }

    fn stop(outcome: &str, violation: &str) -> StopRecord {
        StopRecord {
            stop_date: None,
            stop_time: None,
            country_name: "USA".to_string(),
            driver_gender: "Male".to_string(),
            driver_age: Some(30),
            driver_race: "White".to_string(),
            search_conducted: false,
            search_type: String::new(),
            stop_duration: "0".to_string(),
            drugs_related_stop: false,
            vehicle_number: "AB123".to_string(),
            stop_outcome: outcome.to_string(),
            violation: violation.to_string(),
            is_arrested: outcome == "Arrest",
        }
    }

    #[test]
    fn test_majority_outcome_wins() {
        let records = vec![
            stop("Warning", "Speeding"),
            stop("Warning", "Speeding"),
            stop("Warning", "Speeding"),
            stop("Arrest", "Speeding"),
        ];

        let prediction = predict(&records, &query());

        assert_eq!(prediction.violation, "Speeding");
        assert_eq!(prediction.outcome, "Warning");
        assert_eq!(prediction.matched_rows, 4);
        assert_eq!(prediction.source, PredictionSource::Matched);
    }

    #[test]
    fn test_no_match_falls_back_to_default() {
        let records = vec![stop("Arrest", "DUI")];
        let other = StopQuery {
            country_name: "Canada".to_string(),
            ..query()
        };

        let prediction = predict(&records, &other);

        assert_eq!(prediction, Prediction::fallback());
        assert_eq!(prediction.violation, "Speeding");
        assert_eq!(prediction.outcome, "Warning");
    }

    #[test]
    fn test_matched_mode_differs_from_default() {
        let records = vec![
            stop("Arrest", "DUI"),
            stop("Arrest", "DUI"),
            stop("Warning", "Speeding"),
        ];

        let prediction = predict(&records, &query());

        assert_eq!(prediction.violation, "DUI");
        assert_eq!(prediction.outcome, "Arrest");
        assert_eq!(prediction.source, PredictionSource::Matched);
    }

    #[test]
    fn test_modes_are_independent() {
        let records = vec![
            stop("Ticket", "Seatbelt"),
            stop("Ticket", "Signal"),
            stop("Warning", "Signal"),
        ];

        let prediction = predict(&records, &query());

        assert_eq!(prediction.violation, "Signal");
        assert_eq!(prediction.outcome, "Ticket");
    }

    #[test]
    fn test_every_field_must_match() {
        let mut older = stop("Arrest", "DUI");
        older.driver_age = Some(31);
        let mut searched = stop("Arrest", "DUI");
        searched.search_conducted = true;
        let mut typed = stop("Arrest", "DUI");
        typed.search_type = "Frisk".to_string();
        let mut unknown_age = stop("Arrest", "DUI");
        unknown_age.driver_age = None;

        let prediction = predict(&[older, searched, typed, unknown_age], &query());

        assert_eq!(prediction.source, PredictionSource::Default);
    }

    #[test]
    fn test_gender_matches_stored_text_exactly() {
        let mut abbreviated = stop("Arrest", "DUI");
        abbreviated.driver_gender = "M".to_string();

        assert!(!query().matches(&abbreviated));
        assert!(query().matches(&stop("Arrest", "DUI")));
    }

    #[test]
    fn test_mode_tie_breaks_lexicographically() {
        assert_eq!(mode(["Warning", "Arrest", "Ticket", "Arrest", "Warning"]), Some("Arrest"));
        assert_eq!(mode(["b", "a"]), Some("a"));
        assert_eq!(mode(["Ticket"]), Some("Ticket"));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_tie_break_does_not_depend_on_row_order() {
        let forward = vec![stop("Warning", "Speeding"), stop("Arrest", "DUI")];
        let backward: Vec<StopRecord> = forward.iter().rev().cloned().collect();

        assert_eq!(predict(&forward, &query()), predict(&backward, &query()));
        assert_eq!(predict(&forward, &query()).outcome, "Arrest");
    }

    #[test]
    fn test_empty_dataset_uses_default() {
        assert_eq!(predict(&[], &query()).source, PredictionSource::Default);
    }
}
