//! Core functionality for the data visualization platform
//!
//! This crate provides the column type registry, the time-alignment
//! algorithms and the timeline handles that every chart resolves its
//! display times through.

pub mod column_types;
pub mod time;
pub mod timeline;

use thiserror::Error;

// Re-export commonly used types
pub use column_types::{slugs, CellValue, ColumnKind, FormatOptions, TimeKind, EPOCH_DATE};
pub use time::{
    find_closest_time, find_closest_time_index, get_closest_time_pairs, get_start_end_values,
    sorted_find_closest_index, values_by_entity_at_times, values_by_entity_within_times, DataValue,
    Time, TimeSeries, TimeSeriesPoint, ValuesByEntity,
};
pub use timeline::{Timeline, TimelineContext, TimelineSubscriber};

/// Errors raised by the registry when raw input does not fit a kind
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid {kind} value: {raw:?}")]
    InvalidValue { kind: ColumnKind, raw: String },

    #[error("invalid date: {0}")]
    InvalidDate(String),
}
