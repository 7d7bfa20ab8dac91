pub mod config;
pub mod errors;
pub mod sections;
pub mod telemetry;
