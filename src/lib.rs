//! SecureCheck - traffic-stop analytics over a MySQL police log.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod predict;
pub mod query;
pub mod safety;
pub mod stops;
