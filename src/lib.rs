//! Day-by-day portfolio simulation driven by an external
//! decision oracle, with risk/return statistics over the resulting equity curve.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
