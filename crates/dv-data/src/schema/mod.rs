//! Declared columns of a table

use std::sync::Arc;

use arrow::datatypes::{Field, Schema, SchemaRef};
use chrono::NaiveDate;
use dv_core::column_types::epoch_date;
use dv_core::{slugs, CellValue, ColumnKind, FormatOptions, Time, TimeKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ColumnOverride;
use crate::{DataError, DataResult};

/// Declaration of one column: its kind plus display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub slug: String,
    pub kind: ColumnKind,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub short_unit: Option<String>,
    pub num_decimal_places: Option<usize>,
    pub tolerance: Option<Time>,
}

impl ColumnDef {
    pub fn new(slug: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            slug: slug.into(),
            kind,
            name: None,
            description: None,
            unit: None,
            short_unit: None,
            num_decimal_places: None,
            tolerance: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: Time) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Name to show for the column, falling back to its slug
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.slug)
    }

    /// Declared tolerance, or the kind's default
    pub fn tolerance(&self) -> Time {
        self.tolerance.unwrap_or_else(|| self.kind.default_tolerance())
    }

    /// Options for [`ColumnKind::format`]; the short unit wins over the unit
    pub fn format_options(&self, epoch: NaiveDate) -> FormatOptions {
        let defaults = FormatOptions::default();
        FormatOptions {
            num_decimal_places: self.num_decimal_places.unwrap_or(defaults.num_decimal_places),
            unit: self.short_unit.clone().or_else(|| self.unit.clone()),
            epoch,
            ..defaults
        }
    }

    /// Apply configured overrides on top of the ingested metadata
    pub fn apply_override(&mut self, column_override: &ColumnOverride) {
        if let Some(name) = &column_override.name {
            self.name = Some(name.clone());
        }
        if let Some(unit) = &column_override.unit {
            self.unit = Some(unit.clone());
            self.short_unit = None;
        }
        if let Some(places) = column_override.num_decimal_places {
            self.num_decimal_places = Some(places);
        }
        if let Some(tolerance) = column_override.tolerance {
            self.tolerance = Some(tolerance);
        }
    }
}

/// Ordered set of declared columns plus the table's time coordinate
///
/// Identity columns (`entityName`, `entityId`, `entityCode` and the time
/// column) always come first.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    columns: IndexMap<String, ColumnDef>,
    time_kind: TimeKind,
    epoch: NaiveDate,
}

impl TableSchema {
    pub fn new(time_kind: TimeKind) -> Self {
        let mut columns = IndexMap::new();
        for (slug, kind) in [
            (slugs::ENTITY_NAME, ColumnKind::EntityName),
            (slugs::ENTITY_ID, ColumnKind::EntityId),
            (slugs::ENTITY_CODE, ColumnKind::EntityCode),
            (time_kind.slug(), time_kind.column_kind()),
        ] {
            columns.insert(slug.to_string(), ColumnDef::new(slug, kind));
        }

        Self {
            columns,
            time_kind,
            epoch: epoch_date(),
        }
    }

    pub fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = epoch;
        self
    }

    /// Declare a column, replacing any declaration with the same slug
    ///
    /// Identity columns cannot be redeclared.
    pub fn add_column(&mut self, def: ColumnDef) -> &mut Self {
        if !self.is_identity(&def.slug) {
            self.columns.insert(def.slug.clone(), def);
        }
        self
    }

    pub fn with_column(mut self, def: ColumnDef) -> Self {
        self.add_column(def);
        self
    }

    pub fn get(&self, slug: &str) -> Option<&ColumnDef> {
        self.columns.get(slug)
    }

    /// Checked lookup of a declared column
    pub fn column(&self, slug: &str) -> DataResult<&ColumnDef> {
        self.get(slug).ok_or_else(|| DataError::missing_column(slug))
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.columns.contains_key(slug)
    }

    /// Position of the column in the schema and the stored batch
    pub fn index_of(&self, slug: &str) -> Option<usize> {
        self.columns.get_index_of(slug)
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> + '_ {
        self.columns.values()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Declared columns that are not identity columns
    pub fn value_columns(&self) -> impl Iterator<Item = &ColumnDef> + '_ {
        self.columns.values().filter(|def| !self.is_identity(&def.slug))
    }

    pub fn is_identity(&self, slug: &str) -> bool {
        slug == self.time_slug()
            || slug == slugs::ENTITY_NAME
            || slug == slugs::ENTITY_ID
            || slug == slugs::ENTITY_CODE
    }

    pub fn time_kind(&self) -> TimeKind {
        self.time_kind
    }

    pub fn time_slug(&self) -> &'static str {
        self.time_kind.slug()
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Arrow schema of the stored batch; identity columns are non-nullable
    pub fn to_arrow(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .values()
            .map(|def| Field::new(&def.slug, def.kind.arrow_type(), !self.is_identity(&def.slug)))
            .collect();
        Arc::new(Schema::new(fields))
    }
}

/// Kind of a value column: Number when every value is numeric
pub fn infer_kind<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> ColumnKind {
    if values.into_iter().all(CellValue::is_numeric) {
        ColumnKind::Number
    } else {
        ColumnKind::String
    }
}
