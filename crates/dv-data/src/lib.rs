//! Tabular data engine for the visualization platform
//!
//! A [`Table`] is an immutable entity × time dataset stored as an arrow
//! `RecordBatch`. Filters return new tables linked to their parent, and
//! [`Column`] views memoize derived facts per table instance.

pub mod cache;
pub mod column;
pub mod config;
pub mod ingest;
pub mod population;
pub mod row;
pub mod schema;
pub mod shared;
pub mod table;

use arrow::error::ArrowError;
use dv_core::CoreError;
use thiserror::Error;

// Re-exports
pub use cache::DerivedCache;
pub use column::{Column, ColumnSummary, Observation};
pub use config::{ColumnOverride, IngestConfig, NullConfig};
pub use ingest::{LegacyEntityMeta, LegacyVariable, LegacyVariablesAndEntityKey};
pub use population::{PopulationLookup, PopulationMap};
pub use row::Row;
pub use schema::{ColumnDef, TableSchema};
pub use shared::{SharedTable, TableSubscriber};
pub use table::Table;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Column not found: {slug}")]
    MissingColumn { slug: String },

    #[error("Malformed variable {variable_id}: {reason}")]
    MalformedIngestionInput { variable_id: String, reason: String },

    #[error("Variables mix year- and day-based times")]
    MixedTimeKinds,

    #[error("Row {row} references undeclared column {slug}")]
    UndeclaredColumn { row: usize, slug: String },

    #[error("Entity {entity_name} has conflicting id or code")]
    InconsistentEntity { entity_name: String },

    #[error("Row {row} is missing identity column {slug}")]
    MissingIdentity { row: usize, slug: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl DataError {
    pub(crate) fn missing_column(slug: &str) -> Self {
        DataError::MissingColumn {
            slug: slug.to_string(),
        }
    }

    pub(crate) fn malformed(variable_id: impl ToString, reason: impl Into<String>) -> Self {
        DataError::MalformedIngestionInput {
            variable_id: variable_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                DataError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}

pub type DataResult<T> = Result<T, DataError>;
