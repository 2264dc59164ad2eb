use std::collections::BTreeSet;

use dv_core::{CellValue, Time};
use dv_data::{IngestConfig, PopulationMap, Table};
use serde_json::{json, Map, Value};

const ENTITIES: [(i64, &str, &str); 3] = [(1, "France", "FRA"), (2, "Chad", "TCD"), (3, "Peru", "PER")];
const YEARS: [Time; 4] = [1990, 1995, 2000, 2005];

fn value_of(variable: i64, entity: i64, year: Time) -> f64 {
    (variable * 1000 + entity * 100) as f64 + (year - 1990) as f64 / 4.0
}

/// Three variables, each observed for every entity and year
fn legacy_json() -> Value {
    let mut variables = Map::new();
    for variable in 1..=3_i64 {
        let mut years = Vec::new();
        let mut entities = Vec::new();
        let mut values = Vec::new();
        for (entity, _, _) in ENTITIES {
            for year in YEARS {
                years.push(year);
                entities.push(entity);
                values.push(value_of(variable, entity, year));
            }
        }
        variables.insert(
            variable.to_string(),
            json!({
                "id": variable,
                "name": format!("Indicator {}", variable),
                "years": years,
                "entities": entities,
                "values": values,
            }),
        );
    }

    let entity_key: Map<String, Value> = ENTITIES
        .iter()
        .map(|(id, name, code)| (id.to_string(), json!({ "id": id, "name": name, "code": code })))
        .collect();

    json!({ "variables": variables, "entityKey": entity_key })
}

fn ingested() -> Table {
    Table::from_legacy_json(&legacy_json().to_string(), &IngestConfig::default()).unwrap()
}

#[test]
fn test_round_trip_reproduces_observations() {
    let table = ingested();
    assert_eq!(table.num_rows(), ENTITIES.len() * YEARS.len());

    for variable in 1..=3_i64 {
        let column = table.get(&format!("{}-indicator-{}", variable, variable)).unwrap();
        let observed: BTreeSet<(String, Time, String)> = column
            .observations()
            .iter()
            .map(|o| (o.entity_name.clone(), o.time, o.value.to_string()))
            .collect();

        let expected: BTreeSet<(String, Time, String)> = ENTITIES
            .iter()
            .flat_map(|&(entity, name, _)| {
                YEARS.iter().map(move |&year| {
                    (
                        name.to_string(),
                        year,
                        CellValue::Number(value_of(variable, entity, year)).to_string(),
                    )
                })
            })
            .collect();

        assert_eq!(observed, expected);
    }
}

#[test]
fn test_filters_on_ingested_table() {
    let table = ingested();

    let everything = table.filter_by_time_range(None, None).unwrap();
    assert_eq!(everything.rows(), table.rows());

    let latest = table.filter_by_target_times(&[f64::INFINITY], 0).unwrap();
    assert_eq!(latest.num_rows(), ENTITIES.len());
    assert_eq!(latest.all_times(), vec![2005]);

    let populations = PopulationMap::from_pairs([("France", 67e6), ("Chad", 16e6), ("Peru", 33e6)]);
    let large = table
        .filter_by_population_except(30e6, &["Chad"], &populations)
        .unwrap();
    assert_eq!(large.num_rows(), table.num_rows());

    let small = table
        .filter_by_population_except(50e6, &[] as &[&str], &populations)
        .unwrap();
    assert_eq!(small.available_entity_names(), &["France".to_string()]);

    let times = table
        .get_times_uniq_sorted_asc_for_columns(&["1-indicator-1", "3-indicator-3"])
        .unwrap();
    assert_eq!(times, YEARS.to_vec());
}

#[test]
fn test_lineage_and_export() {
    let table = ingested();
    let narrowed = table
        .filter_by_time_range(Some(1995), Some(2000))
        .unwrap()
        .filter_by_entity_names(&["Peru"])
        .unwrap();

    assert_eq!(narrowed.num_rows(), 2);
    assert_eq!(narrowed.lineage().len(), 3);
    assert_eq!(narrowed.lineage()[0], "from_legacy");

    let text = narrowed.to_delimited(b'\t', None).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("entityName\tentityId\tentityCode\tyear\t1-indicator-1\t2-indicator-2\t3-indicator-3")
    );
    assert_eq!(lines.count(), 2);
}
