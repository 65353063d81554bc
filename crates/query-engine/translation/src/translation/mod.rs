//! Translate a query over row types to an ExecutionPlan (SQL) to be run against the database.

pub mod error;
pub mod evaluator;
pub mod helpers;
pub mod query;
