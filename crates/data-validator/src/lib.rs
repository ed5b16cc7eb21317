//! Data Validation
//!
//! Parses raw JSON request payloads into typed telemetry snapshots.

mod error;
mod snapshot;
mod validator;

pub use error::ValidationError;
pub use snapshot::{field, TelemetrySnapshot, REQUIRED_FIELDS};
pub use validator::{parse_number, Validator};
