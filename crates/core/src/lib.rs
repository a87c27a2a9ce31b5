//! Core library: intake, payload extraction, classification orchestration,
//! folder taxonomy reconciliation, and shell script generation.

pub mod config;
pub mod extractor;
pub mod intake;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod script;
pub mod store;
pub mod taxonomy;
