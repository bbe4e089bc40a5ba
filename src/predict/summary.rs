//! Human-readable summary of a prediction.

use super::{Prediction, StopQuery};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stop entered on the prediction form.
///
/// Date and time are echoed back in the summary but play no part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStopLog {
    pub stop_date: NaiveDate,
    pub stop_time: NaiveTime,
    #[serde(flatten)]
    pub query: StopQuery,
}

/// A new stop together with what was predicted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub log: NewStopLog,
    pub prediction: Prediction,
}

impl PredictionSummary {
    pub fn new(log: NewStopLog, prediction: Prediction) -> Self {
        Self { log, prediction }
    }

    /// The sentence describing the driver and when they were stopped.
    pub fn stop_sentence(&self) -> String {
        let query = &self.log.query;
        format!(
            "A {}-year-old {} driver in {} was stopped at {} on {}.",
            query.driver_age,
            query.driver_gender,
            query.country_name,
            self.log.stop_time.format("%I:%M %p"),
            self.log.stop_date.format("%Y-%m-%d"),
        )
    }
}

impl fmt::Display for PredictionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = &self.log.query;

        writeln!(f, "Prediction Summary")?;
        writeln!(f, "- Predicted Violation: {}", self.prediction.violation)?;
        writeln!(f, "- Predicted Stop Outcome: {}", self.prediction.outcome)?;
        writeln!(f)?;
        writeln!(f, "{}", self.stop_sentence())?;
        writeln!(
            f,
            "{}, and the stop {}.",
            if query.search_conducted {
                "A search was conducted"
            } else {
                "No search was conducted"
            },
            if query.drugs_related_stop {
                "was drug related"
            } else {
                "was not drug related"
            },
        )?;
        write!(
            f,
            "Stop Duration: {}, Vehicle Number: {}",
            query.stop_duration, query.vehicle_number
        )
    }
}
