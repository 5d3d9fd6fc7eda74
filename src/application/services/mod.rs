//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod catalog;
mod export;
mod simulation;

pub use catalog::{parse_line, CatalogService, LoadReport, ParsedLine};
pub use export::ExportService;
pub use simulation::{SimulationOptions, SimulationReport, SimulationService};
