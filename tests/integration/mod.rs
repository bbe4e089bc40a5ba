//! Integration tests for SecureCheck.

pub mod dashboard_test;
pub mod mysql_test;
