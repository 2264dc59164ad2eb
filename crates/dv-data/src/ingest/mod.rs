//! Legacy ingestion
//!
//! Input arrives as sparse per-variable records: every variable carries
//! parallel arrays of times, entity ids and values. Ingestion turns each
//! observation into a candidate row holding that single value, then pivots
//! the candidates into one wide row per (time, entity).

mod legacy;
mod slug;

pub use legacy::{
    LegacyEntityMeta, LegacyVariable, LegacyVariableDisplayConfig, LegacyVariablesAndEntityKey,
};
pub use slug::{slugify, variable_slug};

use ahash::{AHashMap, AHashSet};
use dv_core::column_types::{days_between, parse_date};
use dv_core::{slugs, CellValue, Time, TimeKind};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::row::Row;
use crate::schema::{infer_kind, ColumnDef, TableSchema};
use crate::table::Table;
use crate::{DataError, DataResult};

/// Candidate rows and column declaration of one variable
struct VariableRows {
    time_kind: TimeKind,
    column: ColumnDef,
    rows: Vec<Row>,
}

impl Table {
    /// Pivot legacy variables into one wide table
    pub fn from_legacy(
        input: &LegacyVariablesAndEntityKey,
        config: &IngestConfig,
    ) -> DataResult<Table> {
        let epoch = config.epoch_date()?;

        let mut time_kind = None;
        let mut columns = Vec::with_capacity(input.variables.len());
        let mut candidates = Vec::new();

        let mut variable_ids: AHashSet<i64> = AHashSet::new();
        for variable in input.variables.values() {
            if !variable_ids.insert(variable.id) {
                return Err(DataError::malformed(
                    variable.id,
                    "variable id appears more than once",
                ));
            }
            let variable_rows = variable_to_rows(variable, input, config)?;

            match time_kind {
                Some(kind) if kind != variable_rows.time_kind => {
                    return Err(DataError::MixedTimeKinds)
                }
                _ => time_kind = Some(variable_rows.time_kind),
            }

            columns.push(variable_rows.column);
            candidates.extend(variable_rows.rows);
        }

        let time_kind = time_kind.unwrap_or(TimeKind::Year);
        let mut schema = TableSchema::new(time_kind).with_epoch(epoch);
        for mut column in columns {
            if let Some(column_override) = config.column_override(&column.slug) {
                column.apply_override(column_override);
            }
            schema.add_column(column);
        }

        check_entity_identities(&candidates)?;
        let rows = merge_rows(candidates, time_kind.slug());
        info!(
            "Ingested {} variables into {} rows",
            input.variables.len(),
            rows.len()
        );
        Table::build(schema, rows, "from_legacy")
    }

    /// Parse legacy JSON and pivot it
    pub fn from_legacy_json(json: &str, config: &IngestConfig) -> DataResult<Table> {
        let input = LegacyVariablesAndEntityKey::from_json_str(json)?;
        Self::from_legacy(&input, config)
    }
}

/// Group candidate rows by (time, entity) in first-seen order and merge
/// each group field by field, later rows winning
fn merge_rows(candidates: Vec<Row>, time_slug: &str) -> Vec<Row> {
    let mut groups: IndexMap<(Time, String), Row> = IndexMap::new();
    for row in candidates {
        let key = (
            row.time(time_slug).unwrap_or_default(),
            row.entity_name().unwrap_or_default().to_string(),
        );
        match groups.get_mut(&key) {
            Some(merged) => merged.merge(row),
            None => {
                groups.insert(key, row);
            }
        }
    }
    groups.into_values().collect()
}

/// Every entity name must resolve to one id and code; merging by name
/// would otherwise fold two entities into one row
fn check_entity_identities(candidates: &[Row]) -> DataResult<()> {
    let mut identities: AHashMap<&str, (Option<i64>, Option<&CellValue>)> = AHashMap::new();
    for row in candidates {
        let name = row.entity_name().unwrap_or_default();
        let identity = (row.entity_id(), row.get(slugs::ENTITY_CODE));
        if *identities.entry(name).or_insert(identity) != identity {
            return Err(DataError::InconsistentEntity {
                entity_name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn variable_to_rows(
    variable: &LegacyVariable,
    input: &LegacyVariablesAndEntityKey,
    config: &IngestConfig,
) -> DataResult<VariableRows> {
    let (time_kind, times) = variable.times()?;
    if times.len() != variable.entities.len() || times.len() != variable.values.len() {
        return Err(DataError::malformed(
            variable.id,
            format!(
                "{} times, {} entities and {} values",
                times.len(),
                variable.entities.len(),
                variable.values.len()
            ),
        ));
    }

    let display = &variable.display;
    let shift = match (time_kind, display.zero_day.as_deref()) {
        (TimeKind::Day, Some(zero_day)) => days_between(parse_date(zero_day)?, config.epoch_date()?),
        _ => 0,
    };
    let factor = display
        .conversion_factor
        .filter(|_| config.apply_conversion_factor);

    let values = observed_values(variable, config)?;
    let kind = infer_kind(values.iter().flatten());
    if values.iter().flatten().any(CellValue::is_numeric) && !kind.is_numeric() {
        warn!(
            "Variable {} mixes numbers and text, ingesting it as {}",
            variable.id, kind
        );
    }

    let slug = variable_slug(variable.id, &variable.name);
    let mut seen: AHashSet<(i64, Time)> = AHashSet::new();
    let mut rows = Vec::with_capacity(values.len());

    for ((&raw_time, &entity_id), value) in times.iter().zip(&variable.entities).zip(values) {
        let time = raw_time.checked_add(shift).ok_or_else(|| {
            DataError::malformed(
                variable.id,
                format!("time {} shifted by {} days overflows", raw_time, shift),
            )
        })?;
        if !seen.insert((entity_id, time)) {
            return Err(DataError::malformed(
                variable.id,
                format!("duplicate observation for entity {} at {}", entity_id, time),
            ));
        }

        let entity = input.entity(entity_id).ok_or_else(|| {
            DataError::malformed(variable.id, format!("unknown entity id {}", entity_id))
        })?;

        let Some(value) = value else {
            continue;
        };
        let value = match (value, factor) {
            (CellValue::Int(v), Some(factor)) if kind.is_numeric() => CellValue::Number(v as f64 * factor),
            (CellValue::Number(v), Some(factor)) if kind.is_numeric() => CellValue::Number(v * factor),
            (value, _) => kind.coerce(value)?,
        };

        rows.push(
            Row::with_identity(
                &entity.name,
                entity.id,
                entity.code.as_deref().unwrap_or_default(),
                time_kind.slug(),
                time,
            )
            .with(slug.clone(), value),
        );
    }

    debug!(
        variable_id = variable.id,
        slug = %slug,
        kind = %kind,
        observations = rows.len(),
        "pivoted variable"
    );

    let mut column = ColumnDef::new(slug, kind);
    column.name = Some(display.name.clone().unwrap_or_else(|| variable.name.clone()));
    column.description = variable.description.clone();
    column.unit = display.unit.clone().or_else(|| variable.unit.clone());
    column.short_unit = display.short_unit.clone().or_else(|| variable.short_unit.clone());
    column.num_decimal_places = display.num_decimal_places;
    column.tolerance = display.tolerance;

    Ok(VariableRows {
        time_kind,
        column,
        rows,
    })
}

/// Raw JSON values as cells; `None` marks an absent observation
fn observed_values(
    variable: &LegacyVariable,
    config: &IngestConfig,
) -> DataResult<Vec<Option<CellValue>>> {
    variable
        .values
        .iter()
        .map(|value| {
            if config.null_values.is_null_value(value) {
                return Ok(None);
            }
            match value {
                Value::Number(n) => match n.as_i64() {
                    Some(v) => Ok(Some(CellValue::Int(v))),
                    None => Ok(n.as_f64().map(CellValue::Number)),
                },
                Value::String(s) => Ok(Some(CellValue::Text(s.clone()))),
                other => Err(DataError::malformed(
                    variable.id,
                    format!("unsupported value {}", other),
                )),
            }
        })
        .collect()
}
