//! Per-entity value extraction at or between target times

use indexmap::IndexMap;

use super::{find_closest_time_index, Time, TimeSeries, ValuesByEntity};
use crate::column_types::CellValue;

/// A resolved value; both fields are `None` when nothing qualified
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataValue {
    pub time: Option<Time>,
    pub value: Option<CellValue>,
}

fn values_at_times(series: &TimeSeries, targets: &[f64], tolerance: Time) -> Vec<DataValue> {
    targets
        .iter()
        .map(|&target| match find_closest_time_index(series.times(), target, Some(tolerance)) {
            Some(idx) => DataValue {
                time: Some(series.times()[idx]),
                value: Some(series.values()[idx].clone()),
            },
            None => DataValue::default(),
        })
        .collect()
}

/// One value per entity and target, resolved by nearest time within `tolerance`
pub fn values_by_entity_at_times(
    value_by_entity_and_time: &ValuesByEntity,
    targets: &[f64],
    tolerance: Time,
) -> IndexMap<String, Vec<DataValue>> {
    value_by_entity_and_time
        .iter()
        .map(|(entity, series)| (entity.clone(), values_at_times(series, targets, tolerance)))
        .collect()
}

/// All values per entity whose time lies in `[start, end]`; `None` is unbounded
pub fn values_by_entity_within_times(
    value_by_entity_and_time: &ValuesByEntity,
    start: Option<Time>,
    end: Option<Time>,
) -> IndexMap<String, Vec<DataValue>> {
    value_by_entity_and_time
        .iter()
        .map(|(entity, series)| {
            let times = series.times();
            let from = start.map_or(0, |start| times.partition_point(|&t| t < start));
            let to = end.map_or(times.len(), |end| times.partition_point(|&t| t <= end));
            let values = (from..to.max(from))
                .map(|idx| DataValue {
                    time: Some(times[idx]),
                    value: Some(series.values()[idx].clone()),
                })
                .collect();
            (entity.clone(), values)
        })
        .collect()
}

/// The earliest and the latest of `values` that carry a time
pub fn get_start_end_values(values: &[DataValue]) -> (Option<&DataValue>, Option<&DataValue>) {
    let timed = || values.iter().filter(|dv| dv.time.is_some());
    (
        timed().min_by_key(|dv| dv.time),
        timed().max_by_key(|dv| dv.time),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> ValuesByEntity {
        let mut by_entity = ValuesByEntity::new();
        by_entity.insert(
            "France".to_string(),
            vec![(2000, CellValue::Number(1.0)), (2004, CellValue::Number(2.0))]
                .into_iter()
                .collect(),
        );
        by_entity.insert(
            "Chad".to_string(),
            vec![(2010, CellValue::Number(9.0))].into_iter().collect(),
        );
        by_entity
    }

    #[test]
    fn test_values_at_times_with_tolerance() {
        let result = values_by_entity_at_times(&fixture(), &[2002.0, 2009.0], 1);

        let france = &result["France"];
        assert_eq!(france[0], DataValue::default());
        assert_eq!(france[1], DataValue::default());

        let chad = &result["Chad"];
        assert_eq!(chad[1].time, Some(2010));
        assert_eq!(chad[1].value, Some(CellValue::Number(9.0)));

        let wide = values_by_entity_at_times(&fixture(), &[2002.0], 2);
        assert_eq!(wide["France"][0].time, Some(2004));
    }

    #[test]
    fn test_values_within_times() {
        let result = values_by_entity_within_times(&fixture(), Some(2000), Some(2003));
        assert_eq!(result["France"].len(), 1);
        assert!(result["Chad"].is_empty());

        let all = values_by_entity_within_times(&fixture(), None, None);
        assert_eq!(all["France"].len(), 2);

        let inverted = values_by_entity_within_times(&fixture(), Some(2005), Some(2001));
        assert!(inverted["France"].is_empty());
    }

    #[test]
    fn test_start_end_values() {
        let all = values_by_entity_within_times(&fixture(), None, None);
        let (start, end) = get_start_end_values(&all["France"]);
        assert_eq!(start.and_then(|dv| dv.time), Some(2000));
        assert_eq!(end.and_then(|dv| dv.time), Some(2004));

        let (start, end) = get_start_end_values(&[]);
        assert!(start.is_none() && end.is_none());
    }
}
