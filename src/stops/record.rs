//! Typed rows of the police log.

use super::STOP_COLUMNS;
use crate::db::{ColumnInfo, QueryResult, Value};
use crate::error::{Result, SecureCheckError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

static NULL_VALUE: Value = Value::Null;

/// One traffic stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopRecord {
    pub stop_date: Option<NaiveDate>,
    pub stop_time: Option<NaiveTime>,
    pub country_name: String,
    pub driver_gender: String,
    pub driver_age: Option<i64>,
    pub driver_race: String,
    pub search_conducted: bool,
    /// Empty when no search type was recorded (NULL or '').
    pub search_type: String,
    /// Categorical code kept as text (`"0"`, `"1"`, ...).
    pub stop_duration: String,
    pub drugs_related_stop: bool,
    pub vehicle_number: String,
    pub stop_outcome: String,
    pub violation: String,
    pub is_arrested: bool,
}

/// Column positions resolved once per result set.
struct ColumnMap {
    stop_date: Option<usize>,
    stop_time: Option<usize>,
    country_name: usize,
    driver_gender: usize,
    driver_age: usize,
    driver_race: usize,
    search_conducted: usize,
    search_type: usize,
    stop_duration: usize,
    drugs_related_stop: usize,
    vehicle_number: usize,
    stop_outcome: usize,
    violation: usize,
    is_arrested: Option<usize>,
}

impl ColumnMap {
    fn resolve(result: &QueryResult) -> Result<Self> {
        let required = |name: &str| {
            result.column_index(name).ok_or_else(|| {
                SecureCheckError::query(format!("Police log result has no '{name}' column"))
            })
        };

        Ok(Self {
            stop_date: result.column_index("stop_date"),
            stop_time: result.column_index("stop_time"),
            country_name: required("country_name")?,
            driver_gender: required("driver_gender")?,
            driver_age: required("driver_age")?,
            driver_race: required("driver_race")?,
            search_conducted: required("search_conducted")?,
            search_type: required("search_type")?,
            stop_duration: required("stop_duration")?,
            drugs_related_stop: required("drugs_related_stop")?,
            vehicle_number: required("vehicle_number")?,
            stop_outcome: required("stop_outcome")?,
            violation: required("violation")?,
            is_arrested: result.column_index("is_arrested"),
        })
    }
}

impl StopRecord {
    /// Decodes every row of a `SELECT * FROM policelog` result.
    ///
    /// An empty result with no columns (the shape of a failed connection)
    /// decodes to no records.
    pub fn from_result(result: &QueryResult) -> Result<Vec<StopRecord>> {
        if result.columns.is_empty() && result.rows.is_empty() {
            return Ok(Vec::new());
        }

        let map = ColumnMap::resolve(result)?;

        result
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| -> Result<StopRecord> {
                let cell = |idx: usize| row.get(idx).unwrap_or(&NULL_VALUE);
                let optional = |idx: Option<usize>| idx.map(cell).unwrap_or(&NULL_VALUE);
                let flag = |idx: usize, name: &str| {
                    read_flag(cell(idx)).ok_or_else(|| {
                        SecureCheckError::query(format!(
                            "Row {}: cannot read '{}' in column '{name}' as yes/no",
                            i + 1,
                            cell(idx)
                        ))
                    })
                };

                Ok(StopRecord {
                    stop_date: read_date(optional(map.stop_date)),
                    stop_time: read_time(optional(map.stop_time)),
                    country_name: read_text(cell(map.country_name)),
                    driver_gender: read_text(cell(map.driver_gender)),
                    driver_age: read_int(cell(map.driver_age)),
                    driver_race: read_text(cell(map.driver_race)),
                    search_conducted: flag(map.search_conducted, "search_conducted")?,
                    search_type: read_text(cell(map.search_type)),
                    stop_duration: read_text(cell(map.stop_duration)),
                    drugs_related_stop: flag(map.drugs_related_stop, "drugs_related_stop")?,
                    vehicle_number: read_text(cell(map.vehicle_number)),
                    stop_outcome: read_text(cell(map.stop_outcome)),
                    violation: read_text(cell(map.violation)),
                    is_arrested: map
                        .is_arrested
                        .map(|idx| flag(idx, "is_arrested"))
                        .transpose()?
                        .unwrap_or(false),
                })
            })
            .collect()
    }

    /// The record as a police log row, in `STOP_COLUMNS` order.
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.stop_date),
            Value::from(self.stop_time),
            Value::from(self.country_name.as_str()),
            Value::from(self.driver_gender.as_str()),
            Value::from(self.driver_age),
            Value::from(self.driver_race.as_str()),
            Value::Int(self.search_conducted as i64),
            Value::from(self.search_type.as_str()),
            Value::from(self.stop_duration.as_str()),
            Value::Int(self.drugs_related_stop as i64),
            Value::from(self.vehicle_number.as_str()),
            Value::from(self.stop_outcome.as_str()),
            Value::from(self.violation.as_str()),
            Value::Int(self.is_arrested as i64),
        ]
    }
}

/// Builds a police log result table from records, as `SELECT *` would return it.
pub fn stop_log_table(records: &[StopRecord]) -> QueryResult {
    let types = [
        "DATE", "TIME", "VARCHAR", "VARCHAR", "INT", "VARCHAR", "TINYINT", "VARCHAR", "VARCHAR",
        "TINYINT", "VARCHAR", "VARCHAR", "VARCHAR", "TINYINT",
    ];
    let columns = STOP_COLUMNS
        .iter()
        .zip(types)
        .map(|(name, data_type)| ColumnInfo::new(*name, data_type))
        .collect();

    QueryResult::with_data(columns, records.iter().map(StopRecord::to_row).collect())
}

/// TINYINT(1) columns arrive as booleans; they read back as their stored digit.
fn read_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => (*b as i64).to_string(),
        other => other.to_display_string(),
    }
}

fn read_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Some(true),
            "0" | "false" | "no" | "n" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn read_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn read_time(value: &Value) -> Option<NaiveTime> {
    match value {
        Value::Time(t) => Some(*t),
        Value::DateTime(dt) => Some(dt.time()),
        Value::String(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M"))
            .ok(),
        _ => None,
    }
}
