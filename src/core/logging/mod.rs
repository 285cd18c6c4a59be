// Core admin log module - snapshot diffing and the admin event logger.
// Following the same pattern as the other core modules: models, service, ports.

pub mod diff;
pub mod logging_models;
pub mod logging_service;
pub mod snapshot;

pub use diff::{make_diff, TIMESTAMP_FIELD};
pub use logging_models::*;
pub use logging_service::*;
pub use snapshot::Snapshot;
