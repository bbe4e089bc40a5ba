//! Query execution and the insight catalog for SecureCheck.
//!
//! The executor owns connection lifetime and the read-only guard; the
//! catalog is plain data.

pub mod catalog;
pub mod executor;

pub use catalog::{CatalogEntry, QueryCategory, CATALOG};
pub use executor::{QueryExecutor, StatusReporter, TracingReporter};
