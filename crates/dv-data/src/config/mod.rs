//! Ingestion configuration module

pub mod ingest_config;
pub mod null_handling;

pub use ingest_config::*;
pub use null_handling::*;
