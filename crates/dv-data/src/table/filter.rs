//! Filters returning new tables

use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};
use arrow::array::{Array, BooleanArray};
use arrow::compute::filter_record_batch;
use dv_core::{find_closest_time_index, Time};
use indexmap::IndexMap;
use tracing::debug;

use super::Table;
use crate::population::PopulationLookup;
use crate::{DataError, DataResult};

impl Table {
    /// Child table keeping the rows where `mask` is set, in original order
    fn select(&self, mask: Vec<bool>, operation: String) -> DataResult<Table> {
        let mask = BooleanArray::from(mask);
        let batch = filter_record_batch(self.batch(), &mask)?;
        debug!(
            operation = %operation,
            rows_in = self.num_rows(),
            rows_out = batch.num_rows(),
            "filtered table"
        );
        Ok(self.derive(batch, operation))
    }

    /// Rows whose time lies in `[start, end]`; `None` bounds are unbounded
    pub fn filter_by_time_range(&self, start: Option<Time>, end: Option<Time>) -> DataResult<Table> {
        let mask = self
            .times()
            .iter()
            .map(|&time| start.map_or(true, |s| time >= s) && end.map_or(true, |e| time <= e))
            .collect();

        self.select(
            mask,
            format!("filter_by_time_range({:?}, {:?})", start, end),
        )
    }

    /// Per entity and per target, the one row closest to the target
    ///
    /// Closeness follows [`find_closest_time_index`] over each entity's own
    /// times, so entities with different coverage resolve independently.
    /// Entities without a row within `tolerance` of a target contribute
    /// nothing for it.
    pub fn filter_by_target_times(&self, targets: &[f64], tolerance: Time) -> DataResult<Table> {
        let times = self.times();
        let names = self.entity_name_array();

        let mut rows_by_entity: IndexMap<&str, Vec<(Time, usize)>> = IndexMap::new();
        for (row, &time) in times.iter().enumerate() {
            rows_by_entity
                .entry(names.value(row))
                .or_default()
                .push((time, row));
        }

        let mut mask = vec![false; self.num_rows()];
        for rows in rows_by_entity.values_mut() {
            rows.sort_by_key(|&(time, _)| time);
            let entity_times: Vec<Time> = rows.iter().map(|&(time, _)| time).collect();

            for &target in targets {
                if let Some(index) = find_closest_time_index(&entity_times, target, Some(tolerance)) {
                    mask[rows[index].1] = true;
                }
            }
        }

        self.select(
            mask,
            format!("filter_by_target_times({:?}, {})", targets, tolerance),
        )
    }

    /// Drop entities below `min_population` unless they are excepted
    ///
    /// Entities the lookup does not know are kept.
    pub fn filter_by_population_except<S: AsRef<str>>(
        &self,
        min_population: f64,
        excepted: &[S],
        lookup: &dyn PopulationLookup,
    ) -> DataResult<Table> {
        let excepted: AHashSet<&str> = excepted.iter().map(AsRef::as_ref).collect();
        let keep_entity: AHashMap<&str, bool> = self
            .available_entity_names()
            .iter()
            .map(|name| {
                let keep = excepted.contains(name.as_str())
                    || lookup
                        .population(name)
                        .map_or(true, |population| population >= min_population);
                (name.as_str(), keep)
            })
            .collect();

        let names = self.entity_name_array();
        let mask = (0..self.num_rows())
            .map(|row| keep_entity.get(names.value(row)).copied().unwrap_or(true))
            .collect();

        self.select(
            mask,
            format!("filter_by_population_except({})", min_population),
        )
    }

    /// Rows of the named entities only
    pub fn filter_by_entity_names<S: AsRef<str>>(&self, entity_names: &[S]) -> DataResult<Table> {
        let wanted: AHashSet<&str> = entity_names.iter().map(AsRef::as_ref).collect();
        let names = self.entity_name_array();
        let mask = (0..self.num_rows())
            .map(|row| wanted.contains(names.value(row)))
            .collect();

        self.select(mask, format!("filter_by_entity_names({})", wanted.len()))
    }

    /// Distinct times of the rows where any of `slugs` has a value, ascending
    pub fn get_times_uniq_sorted_asc_for_columns<S: AsRef<str>>(
        &self,
        slugs: &[S],
    ) -> DataResult<Vec<Time>> {
        let times = self.times();
        let mut uniq = BTreeSet::new();

        for slug in slugs {
            let slug = slug.as_ref();
            let index = self
                .schema()
                .index_of(slug)
                .ok_or_else(|| DataError::missing_column(slug))?;
            let array = self.batch().column(index);
            uniq.extend(
                times
                    .iter()
                    .enumerate()
                    .filter(|&(row, _)| array.is_valid(row))
                    .map(|(_, &time)| time),
            );
        }

        Ok(uniq.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_table;
    use super::*;
    use crate::population::PopulationMap;
    use crate::row::Row;
    use crate::schema::TableSchema;
    use dv_core::{CellValue, TimeKind};

    #[test]
    fn test_unbounded_time_range_keeps_everything() {
        let table = sample_table();
        let filtered = table.filter_by_time_range(None, None).unwrap();

        assert_eq!(filtered.rows(), table.rows());
        assert_eq!(filtered.lineage().len(), 2);
        assert!(Table::ptr_eq(filtered.parent().unwrap(), &table));
    }

    #[test]
    fn test_time_range() {
        let table = sample_table();
        let filtered = table.filter_by_time_range(Some(2001), Some(2003)).unwrap();
        assert_eq!(filtered.all_times(), vec![2001, 2003]);

        let inverted = table.filter_by_time_range(Some(2004), Some(2001)).unwrap();
        assert!(inverted.is_empty());
        assert_eq!(inverted.column_slugs(), table.column_slugs());
    }

    #[test]
    fn test_target_times_one_row_per_entity() {
        let table = sample_table();
        let filtered = table.filter_by_target_times(&[2002.0], 1).unwrap();

        // France resolves to 2001, Chad to 2003
        let rows = filtered.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_name(), Some("France"));
        assert_eq!(rows[0].time("year"), Some(2001));
        assert_eq!(rows[1].entity_name(), Some("Chad"));
        assert_eq!(rows[1].time("year"), Some(2003));

        for target in [1999.0, 2000.0, 2002.5, 2004.0, f64::INFINITY] {
            let filtered = table.filter_by_target_times(&[target], 2).unwrap();
            let rows = filtered.rows();
            let names: AHashSet<&str> = rows.iter().filter_map(Row::entity_name).collect();
            assert_eq!(names.len(), rows.len(), "target {}", target);
        }
    }

    #[test]
    fn test_target_times_tie_prefers_later() {
        let table = sample_table();
        let filtered = table.filter_by_target_times(&[2003.0], 2).unwrap();
        let france: Vec<_> = filtered
            .rows()
            .into_iter()
            .filter(|r| r.entity_name() == Some("France"))
            .collect();
        assert_eq!(france.len(), 1);
        assert_eq!(france[0].time("year"), Some(2005));
    }

    #[test]
    fn test_target_times_outside_tolerance() {
        let table = sample_table();
        let filtered = table.filter_by_target_times(&[1990.0], 3).unwrap();
        assert!(filtered.is_empty());

        let both = table.filter_by_target_times(&[2000.0, 2005.0], 0).unwrap();
        assert_eq!(both.num_rows(), 3);
    }

    #[test]
    fn test_population_filter() {
        let table = sample_table();
        let population = PopulationMap::from_pairs([("France", 67e6), ("Chad", 16e6)]);

        let filtered = table
            .filter_by_population_except(20e6, &[] as &[&str], &population)
            .unwrap();
        assert_eq!(filtered.available_entity_names(), &["France".to_string()]);

        let excepted = table
            .filter_by_population_except(20e6, &["Chad"], &population)
            .unwrap();
        assert_eq!(excepted.num_rows(), table.num_rows());

        let unknown = PopulationMap::from_pairs([("France", 1.0)]);
        let filtered = table
            .filter_by_population_except(20e6, &[] as &[&str], &unknown)
            .unwrap();
        assert_eq!(filtered.available_entity_names(), &["Chad".to_string()]);
    }

    #[test]
    fn test_entity_names_filter() {
        let table = sample_table();
        let filtered = table.filter_by_entity_names(&["Chad"]).unwrap();
        assert_eq!(filtered.num_rows(), 2);
        assert_eq!(filtered.entity_name_to_code_map()["Chad"], "TCD");
    }

    #[test]
    fn test_times_for_columns() {
        let table = sample_table();
        assert_eq!(
            table.get_times_uniq_sorted_asc_for_columns(&["1-gdp"]).unwrap(),
            vec![2000, 2001, 2005]
        );
        assert_eq!(
            table
                .get_times_uniq_sorted_asc_for_columns(&["2-region", "1-gdp"])
                .unwrap(),
            vec![2000, 2001, 2003, 2005]
        );
        assert!(matches!(
            table.get_times_uniq_sorted_asc_for_columns(&["nope"]),
            Err(DataError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_filters_on_empty_table() {
        let table = Table::from_rows(TableSchema::new(TimeKind::Year), Vec::<Row>::new()).unwrap();
        let population = PopulationMap::default();

        assert!(table.filter_by_time_range(Some(0), None).unwrap().is_empty());
        assert!(table.filter_by_target_times(&[2000.0], 5).unwrap().is_empty());
        assert!(table
            .filter_by_population_except(1.0, &["x"], &population)
            .unwrap()
            .is_empty());
        assert!(table
            .get_times_uniq_sorted_asc_for_columns(&["year"])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_filtered_values_survive() {
        let table = sample_table();
        let filtered = table.filter_by_time_range(Some(2001), None).unwrap();
        let row = filtered.row(0).unwrap();
        assert_eq!(row.get("2-region"), Some(&CellValue::from("Europe")));
    }
}
