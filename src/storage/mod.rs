//! Configuration files and saved plans.

pub mod config;
pub mod snapshot;

pub use config::{load_config, load_config_from, save_config, save_config_to, AppConfig, AthleteProfile};
pub use snapshot::{PlanSnapshot, SnapshotError};
