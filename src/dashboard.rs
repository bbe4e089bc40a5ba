//! The SecureCheck dashboard.
//!
//! Coordinates the query executor, the insight catalog and the predictor.
//! Each operation is one user interaction: it runs its queries in sequence
//! and returns plain data for the caller to render. Nothing is cached
//! between interactions.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::QueryResult;
use crate::error::Result;
use crate::predict::{predict, NewStopLog, PredictionSummary};
use crate::query::{catalog, CatalogEntry, QueryExecutor};
use crate::stops::{FormColumn, StopRecord, OVERVIEW_SQL};

/// Choices offered by the prediction form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptions {
    pub country_name: Vec<String>,
    pub search_type: Vec<String>,
    pub vehicle_number: Vec<String>,
    pub driver_race: Vec<String>,
}

impl FormOptions {
    /// Options for one column.
    pub fn get(&self, column: FormColumn) -> &[String] {
        match column {
            FormColumn::CountryName => &self.country_name,
            FormColumn::SearchType => &self.search_type,
            FormColumn::VehicleNumber => &self.vehicle_number,
            FormColumn::DriverRace => &self.driver_race,
        }
    }

    fn slot(&mut self, column: FormColumn) -> &mut Vec<String> {
        match column {
            FormColumn::CountryName => &mut self.country_name,
            FormColumn::SearchType => &mut self.search_type,
            FormColumn::VehicleNumber => &mut self.vehicle_number,
            FormColumn::DriverRace => &mut self.driver_race,
        }
    }
}

/// A catalog question together with its result table.
#[derive(Debug, Clone)]
pub struct Insight {
    pub entry: &'static CatalogEntry,
    pub result: QueryResult,
}

/// Entry point for every dashboard interaction.
#[derive(Clone)]
pub struct Dashboard {
    executor: QueryExecutor,
}

impl Dashboard {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// The whole police log.
    pub async fn overview(&self) -> Result<QueryResult> {
        self.executor.execute(OVERVIEW_SQL).await
    }

    /// Every catalog entry, in display order.
    pub fn questions(&self) -> &'static [CatalogEntry] {
        catalog::CATALOG
    }

    /// Runs the catalog entry picked by question text or 1-based position.
    pub async fn insight(&self, selection: &str) -> Result<Insight> {
        let entry = catalog::select(selection)?;
        info!("Running insight: {}", entry.question);
        let result = self.executor.execute(entry.sql).await?;
        Ok(Insight { entry, result })
    }

    /// Distinct values for the four form columns.
    pub async fn form_options(&self) -> Result<FormOptions> {
        let mut options = FormOptions::default();
        for column in FormColumn::ALL {
            *options.slot(column) = self.executor.distinct_values(column).await?;
        }
        Ok(options)
    }

    /// Every stop in the log, decoded.
    pub async fn stop_records(&self) -> Result<Vec<StopRecord>> {
        let table = self.overview().await?;
        StopRecord::from_result(&table)
    }

    /// Predicts violation and outcome for a new stop.
    ///
    /// The police log is fetched fresh for each call.
    pub async fn predict(&self, log: NewStopLog) -> Result<PredictionSummary> {
        let records = self.stop_records().await?;
        let prediction = predict(&records, &log.query);
        debug!(
            "Prediction from {} of {} stops: {} / {}",
            prediction.matched_rows,
            records.len(),
            prediction.violation,
            prediction.outcome
        );
        Ok(PredictionSummary::new(log, prediction))
    }
}
