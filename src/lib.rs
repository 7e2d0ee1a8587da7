pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod language;
pub mod logging;
pub mod pipeline;
pub mod types;

// Ports and their adapters
pub mod app;
pub mod gateway;
pub mod infra;
