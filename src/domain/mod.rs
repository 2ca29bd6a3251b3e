//! Core domain types and logic.

pub mod calendar;
pub mod portfolio;
pub mod decision;
pub mod execution;
pub mod metrics;
pub mod progress;
pub mod backtest;
pub mod config_validation;
pub mod error;
