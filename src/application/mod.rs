//! Application layer: ingestion, simulation and export use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod event_log;
pub mod services;

pub use error::{ApplicationError, ApplicationResult, LineError};
pub use error_ext::IoResultExt;
pub use event_log::EventLog;
