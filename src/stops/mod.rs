//! The traffic-stop dataset.
//!
//! Everything SecureCheck reads lives in one table, `policelog`. This module
//! names that table, its columns, and the small set of columns whose distinct
//! values may be listed for the prediction form.

mod record;

pub use record::{stop_log_table, StopRecord};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The table holding the police log.
pub const STOP_TABLE: &str = "policelog";

/// Statement returning the whole police log.
pub const OVERVIEW_SQL: &str = "SELECT * FROM policelog";

/// Columns of the police log, in table order.
pub const STOP_COLUMNS: [&str; 14] = [
    "stop_date",
    "stop_time",
    "country_name",
    "driver_gender",
    "driver_age",
    "driver_race",
    "search_conducted",
    "search_type",
    "stop_duration",
    "drugs_related_stop",
    "vehicle_number",
    "stop_outcome",
    "violation",
    "is_arrested",
];

/// Driver gender as offered by the prediction form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// The value as stored in `driver_gender`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(format!("Invalid gender: {s}. Expected: Male or Female")),
        }
    }
}

/// Columns whose distinct values populate the prediction form.
///
/// Only these names are ever spliced into SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormColumn {
    CountryName,
    SearchType,
    VehicleNumber,
    DriverRace,
}

impl FormColumn {
    /// Every form column, in the order the form shows them.
    pub const ALL: [FormColumn; 4] = [
        Self::CountryName,
        Self::SearchType,
        Self::VehicleNumber,
        Self::DriverRace,
    ];

    /// The column name in the police log.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::CountryName => "country_name",
            Self::SearchType => "search_type",
            Self::VehicleNumber => "vehicle_number",
            Self::DriverRace => "driver_race",
        }
    }

    /// `SELECT DISTINCT <column> FROM policelog ORDER BY <column>`.
    pub fn distinct_sql(&self) -> String {
        let column = self.column_name();
        format!("SELECT DISTINCT {column} FROM {STOP_TABLE} ORDER BY {column}")
    }
}

impl fmt::Display for FormColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for FormColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.column_name() == s)
            .ok_or_else(|| {
                format!(
                    "'{s}' is not a form column. Expected one of: country_name, search_type, vehicle_number, driver_race"
                )
            })
    }
}
