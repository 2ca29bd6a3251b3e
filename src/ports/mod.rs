//! Port traits: the seams between the simulation core and the outside world.

pub mod config_port;
pub mod decision_port;
pub mod price_port;
pub mod progress_port;
pub mod report_port;
