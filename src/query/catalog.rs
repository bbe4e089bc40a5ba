//! The fixed catalog of insight queries.
//!
//! Each entry pairs the question shown to the user with the statement that
//! answers it. Entries take no parameters: age buckets (<25, 25-40, 41-60,
//! 60+) and the night window (20:00-05:59) are literal in the SQL.

use crate::error::{Result, SecureCheckError};
use serde::Serialize;
use std::fmt;

/// Grouping used when listing the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueryCategory {
    Vehicle,
    Demographic,
    TimeAndDuration,
    Violation,
    Location,
    Complex,
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vehicle => write!(f, "Vehicle-Based"),
            Self::Demographic => write!(f, "Demographic-Based"),
            Self::TimeAndDuration => write!(f, "Time & Duration Based"),
            Self::Violation => write!(f, "Violation-Based"),
            Self::Location => write!(f, "Location-Based"),
            Self::Complex => write!(f, "Complex Queries"),
        }
    }
}

/// One named, parameterless query over the police log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// The question as offered to the user; unique across the catalog.
    pub question: &'static str,
    pub category: QueryCategory,
    pub sql: &'static str,
}

/// Every catalog entry, in display order.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        question: "What are the top 10 vehicle_Number involved in drug-related stops?",
        category: QueryCategory::Vehicle,
        sql: "SELECT vehicle_number, COUNT(*) AS drug_stop_count FROM policelog WHERE drugs_related_stop=1 GROUP BY vehicle_number ORDER BY drug_stop_count DESC LIMIT 10",
    },
    CatalogEntry {
        question: "Which vehicles were most frequently searched?",
        category: QueryCategory::Vehicle,
        sql: "SELECT vehicle_number, COUNT(*) AS search_count FROM policelog WHERE search_conducted='Yes' GROUP BY vehicle_number ORDER BY search_count DESC LIMIT 10",
    },
    CatalogEntry {
        question: "Which driver age group had the highest arrest rate?",
        category: QueryCategory::Demographic,
        sql: "SELECT CASE WHEN driver_age<25 THEN '<25' WHEN driver_age BETWEEN 25 AND 40 THEN '25-40' WHEN driver_age BETWEEN 41 AND 60 THEN '41-60' ELSE '60+' END AS age_group, ROUND(SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS arrest_rate FROM policelog GROUP BY age_group ORDER BY arrest_rate DESC LIMIT 1",
    },
    CatalogEntry {
        question: "What is the gender distribution of drivers stopped in each country?",
        category: QueryCategory::Demographic,
        sql: "SELECT country_name, driver_gender, COUNT(*) AS total_stops FROM policelog GROUP BY country_name, driver_gender ORDER BY country_name",
    },
    CatalogEntry {
        question: "Which race and gender combination has the highest search rate?",
        category: QueryCategory::Demographic,
        sql: "SELECT driver_race, driver_gender, ROUND(SUM(CASE WHEN search_conducted='Yes' THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS search_rate FROM policelog GROUP BY driver_race, driver_gender ORDER BY search_rate DESC LIMIT 1",
    },
    CatalogEntry {
        question: "What time of day sees the most traffic stops?",
        category: QueryCategory::TimeAndDuration,
        sql: "SELECT HOUR(stop_time) AS hour, COUNT(*) AS total_stops FROM policelog GROUP BY hour ORDER BY total_stops DESC LIMIT 1",
    },
    CatalogEntry {
        question: "What is the average stop duration for different violations?",
        category: QueryCategory::TimeAndDuration,
        sql: "SELECT violation, ROUND(AVG(CAST(stop_duration AS DECIMAL(10,2))),2) AS avg_duration FROM policelog GROUP BY violation ORDER BY avg_duration DESC",
    },
    CatalogEntry {
        question: "Are stops during the night more likely to lead to arrests?",
        category: QueryCategory::TimeAndDuration,
        sql: "SELECT CASE WHEN HOUR(stop_time) BETWEEN 20 AND 23 OR HOUR(stop_time) BETWEEN 0 AND 5 THEN 'Night' ELSE 'Day' END AS time_period, ROUND(SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS arrest_rate FROM policelog GROUP BY time_period",
    },
    CatalogEntry {
        question: "Which violations are most associated with searches or arrests?",
        category: QueryCategory::Violation,
        sql: "SELECT violation, SUM(CASE WHEN search_conducted='Yes' THEN 1 ELSE 0 END) AS total_searches, SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END) AS total_arrests FROM policelog GROUP BY violation ORDER BY total_searches+total_arrests DESC LIMIT 5",
    },
    CatalogEntry {
        question: "Which violations are most common among younger drivers (<25)?",
        category: QueryCategory::Violation,
        sql: "SELECT violation, COUNT(*) AS total_cases FROM policelog WHERE driver_age<25 GROUP BY violation ORDER BY total_cases DESC LIMIT 5",
    },
    CatalogEntry {
        question: "Is there a violation that rarely results in search or arrest?",
        category: QueryCategory::Violation,
        sql: "SELECT violation, ROUND(SUM(CASE WHEN search_conducted='Yes' THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS search_rate, ROUND(SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS arrest_rate FROM policelog GROUP BY violation HAVING search_rate<1 AND arrest_rate<1",
    },
    CatalogEntry {
        question: "Which countries report the highest rate of drug-related stops?",
        category: QueryCategory::Location,
        sql: "SELECT country_name, ROUND(SUM(CASE WHEN drugs_related_stop=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS drug_stop_rate FROM policelog GROUP BY country_name ORDER BY drug_stop_rate DESC LIMIT 5",
    },
    CatalogEntry {
        question: "What is the arrest rate by country and violation?",
        category: QueryCategory::Location,
        sql: "SELECT country_name, violation, ROUND(SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS arrest_rate FROM policelog GROUP BY country_name, violation ORDER BY arrest_rate DESC",
    },
    CatalogEntry {
        question: "Which country has the most stops with search conducted?",
        category: QueryCategory::Location,
        sql: "SELECT country_name, COUNT(*) AS total_searches FROM policelog WHERE search_conducted='Yes' GROUP BY country_name ORDER BY total_searches DESC LIMIT 1",
    },
    CatalogEntry {
        question: "Yearly Breakdown of Stops and Arrests by Country",
        category: QueryCategory::Complex,
        sql: "SELECT YEAR(stop_date) AS year, country_name, ROUND(SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS arrest_rate FROM policelog GROUP BY year, country_name ORDER BY year, country_name",
    },
    CatalogEntry {
        question: "Driver Violation Trends Based on Age and Race",
        category: QueryCategory::Complex,
        sql: "SELECT driver_race, CASE WHEN driver_age<25 THEN '<25' WHEN driver_age BETWEEN 25 AND 40 THEN '25-40' WHEN driver_age BETWEEN 41 AND 60 THEN '41-60' ELSE '60+' END AS age_group, violation, COUNT(*) AS total_cases FROM policelog GROUP BY driver_race, age_group, violation ORDER BY total_cases DESC",
    },
    CatalogEntry {
        question: "Time Period Analysis of Stops (Joining with Date Functions) , Number of Stops by Year,Month, Hour of the Day",
        category: QueryCategory::Complex,
        sql: "SELECT YEAR(stop_date) AS year, MONTH(stop_date) AS month, HOUR(stop_time) AS hour, COUNT(*) AS total_stops FROM policelog GROUP BY year, month, hour ORDER BY year, month, hour",
    },
    CatalogEntry {
        question: "Violations with High Search and Arrest Rates",
        category: QueryCategory::Complex,
        sql: "SELECT violation, ROUND(SUM(CASE WHEN search_conducted='Yes' THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS search_rate, ROUND(SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS arrest_rate FROM policelog GROUP BY violation ORDER BY arrest_rate DESC, search_rate DESC",
    },
    CatalogEntry {
        question: "Driver Demographics by Country (Age, Gender, and Race)",
        category: QueryCategory::Complex,
        sql: "SELECT country_name, ROUND(AVG(driver_age),1) AS avg_age, COUNT(DISTINCT driver_gender) AS gender_variety, COUNT(DISTINCT driver_race) AS race_variety FROM policelog GROUP BY country_name",
    },
    CatalogEntry {
        question: "Top 5 Violations with Highest Arrest Rates",
        category: QueryCategory::Complex,
        sql: "SELECT violation, ROUND(SUM(CASE WHEN is_arrested=1 THEN 1 ELSE 0 END)*100.0/COUNT(*),2) AS arrest_rate FROM policelog GROUP BY violation ORDER BY arrest_rate DESC LIMIT 5",
    },
];

/// Returns the SQL answering `question`.
pub fn lookup(question: &str) -> Result<&'static str> {
    find(question).map(|entry| entry.sql)
}

/// Returns the catalog entry for `question`.
pub fn find(question: &str) -> Result<&'static CatalogEntry> {
    CATALOG
        .iter()
        .find(|entry| entry.question == question)
        .ok_or_else(|| SecureCheckError::catalog(format!("No catalog entry for '{question}'")))
}

/// Resolves a selection given either as the full question or as a 1-based position.
pub fn select(selection: &str) -> Result<&'static CatalogEntry> {
    if let Ok(position) = selection.trim().parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|index| CATALOG.get(index))
            .ok_or_else(|| {
                SecureCheckError::catalog(format!(
                    "Catalog position {position} is out of range (1-{})",
                    CATALOG.len()
                ))
            });
    }
    find(selection)
}

/// Iterates the questions, in display order.
pub fn questions() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|entry| entry.question)
}
