//! Time-alignment engine
//!
//! Stateless algorithms over ascending time sequences: nearest-time lookup
//! under a tolerance, pairing of two irregular series, and per-entity value
//! extraction at or between target times.
//!
//! Stored time coordinates are integers ([`Time`]). Query targets are `f64`
//! so they can be fractional or carry `-∞`/`+∞`, which stand for "earliest"
//! and "latest".

mod closest;
mod pairs;
mod values;

use indexmap::IndexMap;

use crate::column_types::CellValue;

pub use closest::{find_closest_time, find_closest_time_index, sorted_find_closest_index};
pub use pairs::get_closest_time_pairs;
pub use values::{
    get_start_end_values, values_by_entity_at_times, values_by_entity_within_times, DataValue,
};

/// Integer time coordinate (a year, or a day offset from the epoch)
pub type Time = i64;

/// Per-entity series, keyed by entity name in first-seen order
pub type ValuesByEntity = IndexMap<String, TimeSeries>;

pub fn is_negative_infinity(target: f64) -> bool {
    target == f64::NEG_INFINITY
}

pub fn is_positive_infinity(target: f64) -> bool {
    target == f64::INFINITY
}

/// One observation of a series
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub time: Time,
    pub value: CellValue,
}

/// Values of one entity ordered ascending by time, at most one per time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    times: Vec<Time>,
    values: Vec<CellValue>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any value already stored at `time`
    pub fn insert(&mut self, time: Time, value: CellValue) {
        match self.times.binary_search(&time) {
            Ok(idx) => self.values[idx] = value,
            Err(idx) => {
                self.times.insert(idx, time);
                self.values.insert(idx, value);
            }
        }
    }

    pub fn get(&self, time: Time) -> Option<&CellValue> {
        self.times
            .binary_search(&time)
            .ok()
            .map(|idx| &self.values[idx])
    }

    pub fn times(&self) -> &[Time] {
        &self.times
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, &CellValue)> + '_ {
        self.times.iter().copied().zip(self.values.iter())
    }

    pub fn points(&self) -> Vec<TimeSeriesPoint> {
        self.iter()
            .map(|(time, value)| TimeSeriesPoint {
                time,
                value: value.clone(),
            })
            .collect()
    }
}

impl FromIterator<(Time, CellValue)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (Time, CellValue)>>(iter: I) -> Self {
        let mut points: Vec<(Time, CellValue)> = iter.into_iter().collect();
        points.sort_by_key(|(time, _)| *time);

        let mut series = TimeSeries::new();
        for (time, value) in points {
            // Sorted input: a repeated time replaces the previous value
            if series.times.last() == Some(&time) {
                if let Some(last) = series.values.last_mut() {
                    *last = value;
                }
            } else {
                series.times.push(time);
                series.values.push(value);
            }
        }
        series
    }
}
