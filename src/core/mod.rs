//! Core types: random keys, configuration, errors and shared data types.

pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use config::{TrainConfig, TracerConfig};
pub use error::{Result, TrainError};
pub use rng::{KeyRng, RngKey};
pub use types::{metrics, ActionId, Metrics, Observation, Policy};
