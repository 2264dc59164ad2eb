//! Read-only column views over a table
//!
//! A [`Column`] borrows its table and projects the rows where its slug has a
//! value into (entity, time, value) observations. Everything derived from
//! those observations is summarized once per table instance and shared by
//! every view of the same column.

use std::sync::Arc;

use dv_core::{
    values_by_entity_at_times, values_by_entity_within_times, CellValue, ColumnKind, DataValue,
    Time, TimeSeries, ValuesByEntity,
};
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;

use crate::schema::ColumnDef;
use crate::table::Table;

/// One defined value of a column
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity_name: String,
    pub time: Time,
    pub value: CellValue,
}

/// Facts derived from a column's observations
#[derive(Debug, Clone, Default)]
pub struct ColumnSummary {
    /// Observations in table row order
    pub observations: Vec<Observation>,
    /// Per-entity series, entities in first-seen order
    pub value_by_entity_name_and_time: ValuesByEntity,
    /// Distinct times with a value, ascending
    pub uniq_times: Vec<Time>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl ColumnSummary {
    pub(crate) fn compute(table: &Table, index: usize) -> Self {
        let names = table.entity_name_array();
        let times = table.times();

        let observations: Vec<Observation> = (0..table.num_rows())
            .filter_map(|row| {
                table.cell(index, row).map(|value| Observation {
                    entity_name: names.value(row).to_string(),
                    time: times[row],
                    value,
                })
            })
            .collect();

        let mut value_by_entity_name_and_time = ValuesByEntity::new();
        for observation in &observations {
            value_by_entity_name_and_time
                .entry(observation.entity_name.clone())
                .or_insert_with(TimeSeries::new)
                .insert(observation.time, observation.value.clone());
        }

        let mut uniq_times: Vec<Time> = observations.iter().map(|o| o.time).collect();
        uniq_times.sort_unstable();
        uniq_times.dedup();

        let numbers = || observations.iter().filter_map(|o| o.value.as_f64());
        let min_value = numbers().reduce(f64::min);
        let max_value = numbers().reduce(f64::max);

        Self {
            observations,
            value_by_entity_name_and_time,
            uniq_times,
            min_value,
            max_value,
        }
    }
}

/// View of one declared column of a table
pub struct Column<'t> {
    table: &'t Table,
    def: &'t ColumnDef,
    index: usize,
    summary: OnceCell<Arc<ColumnSummary>>,
}

impl<'t> Column<'t> {
    pub(crate) fn new(table: &'t Table, def: &'t ColumnDef, index: usize) -> Self {
        Self {
            table,
            def,
            index,
            summary: OnceCell::new(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.def.slug
    }

    pub fn kind(&self) -> ColumnKind {
        self.def.kind
    }

    pub fn def(&self) -> &ColumnDef {
        self.def
    }

    pub fn table(&self) -> &Table {
        self.table
    }

    /// Display name, falling back to the slug
    pub fn name(&self) -> &str {
        self.def.display_name()
    }

    /// Unit to show next to values; the short unit wins
    pub fn unit(&self) -> Option<&str> {
        self.def.short_unit.as_deref().or(self.def.unit.as_deref())
    }

    /// Maximum time distance when resolving a value near a time
    pub fn tolerance(&self) -> Time {
        self.def.tolerance()
    }

    pub fn summary(&self) -> &ColumnSummary {
        self.summary
            .get_or_init(|| self.table.column_summary(&self.def.slug, self.index))
    }

    pub fn observations(&self) -> &[Observation] {
        &self.summary().observations
    }

    /// Defined values in row order
    pub fn values(&self) -> Vec<&CellValue> {
        self.observations().iter().map(|o| &o.value).collect()
    }

    pub fn num_values(&self) -> usize {
        self.observations().len()
    }

    /// Entities with at least one value, in first-seen order
    pub fn uniq_entity_names(&self) -> Vec<&str> {
        self.summary()
            .value_by_entity_name_and_time
            .keys()
            .map(String::as_str)
            .collect()
    }

    pub fn uniq_times(&self) -> &[Time] {
        &self.summary().uniq_times
    }

    pub fn min_time(&self) -> Option<Time> {
        self.uniq_times().first().copied()
    }

    pub fn max_time(&self) -> Option<Time> {
        self.uniq_times().last().copied()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.summary().min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.summary().max_value
    }

    pub fn value_by_entity_name_and_time(&self) -> &ValuesByEntity {
        &self.summary().value_by_entity_name_and_time
    }

    /// Exact value for an entity at a time
    pub fn value_for(&self, entity_name: &str, time: Time) -> Option<&CellValue> {
        self.value_by_entity_name_and_time()
            .get(entity_name)
            .and_then(|series| series.get(time))
    }

    /// Per entity, the value nearest each target within the column tolerance
    pub fn values_at_times(&self, targets: &[f64]) -> IndexMap<String, Vec<DataValue>> {
        values_by_entity_at_times(self.value_by_entity_name_and_time(), targets, self.tolerance())
    }

    /// Per entity, all values with time in `[start, end]`
    pub fn values_within_times(
        &self,
        start: Option<Time>,
        end: Option<Time>,
    ) -> IndexMap<String, Vec<DataValue>> {
        values_by_entity_within_times(self.value_by_entity_name_and_time(), start, end)
    }

    /// Display string using the column's decimal places and unit
    pub fn format_value(&self, value: &CellValue) -> String {
        let options = self.def.format_options(self.table.schema().epoch());
        self.def.kind.format(value, &options)
    }
}
