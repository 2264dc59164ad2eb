//! Immutable entity × time tables
//!
//! A [`Table`] is a cheap handle to an arrow `RecordBatch` plus its declared
//! schema. Tables never change after construction: every filter builds a new
//! table that keeps a handle to its parent, so the chain of operations that
//! produced a table can be inspected with [`Table::lineage`].
//!
//! Derived facts (the entity index, per-column summaries) are computed on
//! first use and cached inside the table instance they describe.

mod filter;

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use arrow::array::{Array, ArrayRef, AsArray, Float64Builder, Int64Builder, StringArray, StringBuilder};
use arrow::compute;
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use dv_core::{slugs, CellValue, ColumnKind, FormatOptions, Time, TimeKind};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::info;

use crate::cache::DerivedCache;
use crate::column::{Column, ColumnSummary};
use crate::row::Row;
use crate::schema::{ColumnDef, TableSchema};
use crate::{DataError, DataResult};

// Identity columns always lead the schema in this order
const ENTITY_NAME_INDEX: usize = 0;
const ENTITY_ID_INDEX: usize = 1;
const ENTITY_CODE_INDEX: usize = 2;
const TIME_INDEX: usize = 3;

/// Entity identity facts, in first-seen order
#[derive(Debug, Default)]
struct EntityIndex {
    names: Vec<String>,
    name_to_id: IndexMap<String, i64>,
    name_to_code: IndexMap<String, String>,
}

struct TableInner {
    schema: TableSchema,
    batch: RecordBatch,
    parent: Option<Table>,
    operation: String,
    entities: OnceCell<EntityIndex>,
    cache: DerivedCache,
}

/// Immutable, columnar dataset keyed by (entity, time)
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Build a table from rows, checking them against `schema`
    ///
    /// Every key of every row must be declared, every row must carry the
    /// identity columns and the schema's time column, and an entity name
    /// must always come with the same id and code.
    pub fn from_rows(schema: TableSchema, rows: Vec<Row>) -> DataResult<Self> {
        Self::build(schema, rows, "from_rows")
    }

    pub(crate) fn build(schema: TableSchema, rows: Vec<Row>, operation: &str) -> DataResult<Self> {
        validate_rows(&schema, &rows)?;

        let columns = schema
            .columns()
            .map(|def| build_array(def, &rows))
            .collect::<DataResult<Vec<ArrayRef>>>()?;
        let batch = RecordBatch::try_new(schema.to_arrow(), columns)?;

        info!(
            "Created table ({}) with {} rows and {} columns",
            operation,
            batch.num_rows(),
            batch.num_columns()
        );
        Ok(Self::from_parts(schema, batch, None, operation.to_string()))
    }

    /// A table with the given columns and no rows
    pub fn empty(schema: TableSchema) -> DataResult<Self> {
        Self::from_rows(schema, Vec::new())
    }

    fn from_parts(
        schema: TableSchema,
        batch: RecordBatch,
        parent: Option<Table>,
        operation: String,
    ) -> Self {
        Self {
            inner: Arc::new(TableInner {
                schema,
                batch,
                parent,
                operation,
                entities: OnceCell::new(),
                cache: DerivedCache::new(),
            }),
        }
    }

    /// Child table over `batch`, sharing this table's schema
    fn derive(&self, batch: RecordBatch, operation: String) -> Self {
        Self::from_parts(self.inner.schema.clone(), batch, Some(self.clone()), operation)
    }

    pub fn schema(&self) -> &TableSchema {
        &self.inner.schema
    }

    /// The stored arrow batch
    pub fn batch(&self) -> &RecordBatch {
        &self.inner.batch
    }

    pub fn num_rows(&self) -> usize {
        self.inner.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn time_kind(&self) -> TimeKind {
        self.inner.schema.time_kind()
    }

    pub fn time_slug(&self) -> &'static str {
        self.inner.schema.time_slug()
    }

    pub fn has_day_column(&self) -> bool {
        self.time_kind() == TimeKind::Day
    }

    pub fn column_slugs(&self) -> Vec<&str> {
        self.inner.schema.slugs().collect()
    }

    /// Whether `slug` is a declared column
    pub fn has(&self, slug: &str) -> bool {
        self.inner.schema.contains(slug)
    }

    /// Column view for `slug`
    pub fn get(&self, slug: &str) -> DataResult<Column<'_>> {
        let index = self
            .inner
            .schema
            .index_of(slug)
            .ok_or_else(|| DataError::missing_column(slug))?;
        let def = self.inner.schema.column(slug)?;
        Ok(Column::new(self, def, index))
    }

    /// Column views for `slugs`, failing on the first undeclared one
    pub fn get_columns<S: AsRef<str>>(&self, slugs: &[S]) -> DataResult<Vec<Column<'_>>> {
        slugs.iter().map(|slug| self.get(slug.as_ref())).collect()
    }

    /// Operation that produced this table
    pub fn operation(&self) -> &str {
        &self.inner.operation
    }

    /// Table this one was derived from
    pub fn parent(&self) -> Option<&Table> {
        self.inner.parent.as_ref()
    }

    /// Operations from the root table down to this one
    pub fn lineage(&self) -> Vec<String> {
        let mut operations = Vec::new();
        let mut current = Some(self);
        while let Some(table) = current {
            operations.push(table.operation().to_string());
            current = table.parent();
        }
        operations.reverse();
        operations
    }

    /// Whether both handles point at the same table instance
    pub fn ptr_eq(a: &Table, b: &Table) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn times(&self) -> &[Time] {
        self.inner
            .batch
            .column(TIME_INDEX)
            .as_primitive::<Int64Type>()
            .values()
    }

    pub(crate) fn entity_name_array(&self) -> &StringArray {
        self.inner.batch.column(ENTITY_NAME_INDEX).as_string::<i32>()
    }

    /// Value at (`column`, `row`); `None` when null or out of range
    pub(crate) fn cell(&self, column: usize, row: usize) -> Option<CellValue> {
        let array = self.inner.batch.columns().get(column)?;
        if row >= array.len() || array.is_null(row) {
            return None;
        }

        match array.data_type() {
            DataType::Float64 => Some(CellValue::Number(array.as_primitive::<Float64Type>().value(row))),
            DataType::Int64 => Some(CellValue::Int(array.as_primitive::<Int64Type>().value(row))),
            DataType::Utf8 => Some(CellValue::Text(array.as_string::<i32>().value(row).to_string())),
            _ => None,
        }
    }

    /// Cached summary of the column at `index`
    pub(crate) fn column_summary(&self, slug: &str, index: usize) -> Arc<ColumnSummary> {
        self.inner
            .cache
            .get_or_insert_with(slug, || ColumnSummary::compute(self, index))
    }

    fn entities(&self) -> &EntityIndex {
        self.inner.entities.get_or_init(|| {
            let names = self.entity_name_array();
            let ids = self.inner.batch.column(ENTITY_ID_INDEX).as_primitive::<Int64Type>();
            let codes = self.inner.batch.column(ENTITY_CODE_INDEX).as_string::<i32>();

            let mut index = EntityIndex::default();
            for row in 0..self.num_rows() {
                let name = names.value(row);
                if index.name_to_id.contains_key(name) {
                    continue;
                }
                index.names.push(name.to_string());
                index.name_to_id.insert(name.to_string(), ids.value(row));
                index.name_to_code.insert(name.to_string(), codes.value(row).to_string());
            }
            index
        })
    }

    /// Distinct entity names in order of first appearance
    pub fn available_entity_names(&self) -> &[String] {
        &self.entities().names
    }

    pub fn entity_name_to_id_map(&self) -> &IndexMap<String, i64> {
        &self.entities().name_to_id
    }

    pub fn entity_name_to_code_map(&self) -> &IndexMap<String, String> {
        &self.entities().name_to_code
    }

    pub fn entity_id_to_name_map(&self) -> IndexMap<i64, String> {
        self.entities()
            .name_to_id
            .iter()
            .map(|(name, id)| (*id, name.clone()))
            .collect()
    }

    pub fn min_time(&self) -> Option<Time> {
        compute::min(self.inner.batch.column(TIME_INDEX).as_primitive::<Int64Type>())
    }

    pub fn max_time(&self) -> Option<Time> {
        compute::max(self.inner.batch.column(TIME_INDEX).as_primitive::<Int64Type>())
    }

    /// Distinct times of all rows, ascending
    pub fn all_times(&self) -> Vec<Time> {
        let mut times = self.times().to_vec();
        times.sort_unstable();
        times.dedup();
        times
    }

    /// Row at `index` with its defined values
    pub fn row(&self, index: usize) -> Option<Row> {
        if index >= self.num_rows() {
            return None;
        }
        Some(
            self.inner
                .schema
                .slugs()
                .enumerate()
                .filter_map(|(column, slug)| {
                    self.cell(column, index).map(|value| (slug.to_string(), value))
                })
                .collect(),
        )
    }

    /// All rows with their defined values
    pub fn rows(&self) -> Vec<Row> {
        (0..self.num_rows()).filter_map(|index| self.row(index)).collect()
    }

    /// Delimited text with a header line, optionally limited to the first rows
    pub fn to_delimited(&self, delimiter: u8, row_limit: Option<usize>) -> DataResult<String> {
        let rows = row_limit.map_or(self.num_rows(), |limit| limit.min(self.num_rows()));
        let batch = self.inner.batch.slice(0, rows);

        let mut writer = WriterBuilder::new()
            .with_delimiter(delimiter)
            .with_header(true)
            .build(Vec::new());
        writer.write(&batch)?;

        String::from_utf8(writer.into_inner()).map_err(|e| DataError::Other(e.to_string()))
    }

    /// Summary line plus a pretty-printed preview of the first rows
    pub fn describe(&self, preview_rows: usize) -> DataResult<String> {
        let time_kind = self.time_kind().column_kind();
        let options = FormatOptions {
            epoch: self.inner.schema.epoch(),
            ..FormatOptions::default()
        };
        let format_time = |time: Option<Time>| {
            time.map_or_else(|| "-".to_string(), |t| time_kind.format(&CellValue::Int(t), &options))
        };

        let preview = self.inner.batch.slice(0, preview_rows.min(self.num_rows()));
        Ok(format!(
            "{} rows, {} columns, {} entities, {} {} to {}\nlineage: {}\n{}",
            self.num_rows(),
            self.inner.schema.len(),
            self.available_entity_names().len(),
            self.time_slug(),
            format_time(self.min_time()),
            format_time(self.max_time()),
            self.lineage().join(" > "),
            pretty_format_batches(&[preview])?
        ))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("operation", &self.inner.operation)
            .field("rows", &self.num_rows())
            .field("columns", &self.column_slugs())
            .finish()
    }
}

fn validate_rows(schema: &TableSchema, rows: &[Row]) -> DataResult<()> {
    let time_slug = schema.time_slug();
    let mut identities: AHashMap<&str, (i64, &str)> = AHashMap::new();

    for (index, row) in rows.iter().enumerate() {
        if let Some(slug) = row.slugs().find(|slug| !schema.contains(slug)) {
            return Err(DataError::UndeclaredColumn {
                row: index,
                slug: slug.to_string(),
            });
        }

        let missing = |slug: &str| DataError::MissingIdentity {
            row: index,
            slug: slug.to_string(),
        };
        let name = row.entity_name().ok_or_else(|| missing(slugs::ENTITY_NAME))?;
        let id = row
            .get(slugs::ENTITY_ID)
            .and_then(CellValue::as_i64)
            .ok_or_else(|| missing(slugs::ENTITY_ID))?;
        let code = row
            .get(slugs::ENTITY_CODE)
            .and_then(CellValue::as_str)
            .ok_or_else(|| missing(slugs::ENTITY_CODE))?;
        row.time(time_slug).ok_or_else(|| missing(time_slug))?;

        let known = identities.entry(name).or_insert((id, code));
        if *known != (id, code) {
            return Err(DataError::InconsistentEntity {
                entity_name: name.to_string(),
            });
        }
    }

    Ok(())
}

fn build_array(def: &ColumnDef, rows: &[Row]) -> DataResult<ArrayRef> {
    let values = rows
        .iter()
        .map(|row| row.get(&def.slug).map(|value| def.kind.coerce(value.clone())).transpose())
        .collect::<Result<Vec<Option<CellValue>>, _>>()?;

    let array: ArrayRef = match def.kind {
        ColumnKind::Number => {
            let mut builder = Float64Builder::with_capacity(values.len());
            for value in &values {
                builder.append_option(value.as_ref().and_then(CellValue::as_f64));
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Year | ColumnKind::Day | ColumnKind::EntityId => {
            let mut builder = Int64Builder::with_capacity(values.len());
            for value in &values {
                builder.append_option(value.as_ref().and_then(CellValue::as_i64));
            }
            Arc::new(builder.finish())
        }
        ColumnKind::String | ColumnKind::EntityName | ColumnKind::EntityCode => {
            let mut builder = StringBuilder::new();
            for value in &values {
                builder.append_option(value.as_ref().and_then(CellValue::as_str));
            }
            Arc::new(builder.finish())
        }
    };

    Ok(array)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two entities over three years with one numeric and one text column
    pub(crate) fn sample_table() -> Table {
        let schema = TableSchema::new(TimeKind::Year)
            .with_column(ColumnDef::new("1-gdp", ColumnKind::Number).with_tolerance(1))
            .with_column(ColumnDef::new("2-region", ColumnKind::String));

        let rows = vec![
            Row::with_identity("France", 1, "FRA", "year", 2000).with("1-gdp", 10.0),
            Row::with_identity("Chad", 2, "TCD", "year", 2000).with("1-gdp", 1.0),
            Row::with_identity("France", 1, "FRA", "year", 2001)
                .with("1-gdp", 11.0)
                .with("2-region", "Europe"),
            Row::with_identity("Chad", 2, "TCD", "year", 2003).with("2-region", "Africa"),
            Row::with_identity("France", 1, "FRA", "year", 2005).with("1-gdp", 15.0),
        ];

        Table::from_rows(schema, rows).unwrap()
    }

    #[test]
    fn test_from_rows_round_trip() {
        let table = sample_table();
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.operation(), "from_rows");

        let row = table.row(2).unwrap();
        assert_eq!(row.entity_name(), Some("France"));
        assert_eq!(row.get("1-gdp"), Some(&CellValue::Number(11.0)));
        assert_eq!(row.get("2-region"), Some(&CellValue::from("Europe")));

        // Missing values stay absent
        assert!(!table.row(0).unwrap().contains("2-region"));
        assert!(table.row(5).is_none());
        assert_eq!(table.rows().len(), 5);
    }

    #[test]
    fn test_undeclared_column_rejected() {
        let rows = vec![Row::with_identity("France", 1, "FRA", "year", 2000).with("extra", 1.0)];
        let result = Table::from_rows(TableSchema::new(TimeKind::Year), rows);
        assert!(matches!(result, Err(DataError::UndeclaredColumn { row: 0, slug }) if slug == "extra"));
    }

    #[test]
    fn test_wrong_time_kind_rejected() {
        let rows = vec![Row::with_identity("France", 1, "FRA", "day", 3)];
        let result = Table::from_rows(TableSchema::new(TimeKind::Year), rows);
        assert!(matches!(result, Err(DataError::UndeclaredColumn { .. })));
    }

    #[test]
    fn test_missing_identity_rejected() {
        let mut row = Row::new();
        row.insert("entityName", "France");
        row.insert("year", 2000_i64);
        let result = Table::from_rows(TableSchema::new(TimeKind::Year), vec![row]);
        assert!(matches!(result, Err(DataError::MissingIdentity { slug, .. }) if slug == "entityId"));
    }

    #[test]
    fn test_inconsistent_entity_rejected() {
        let rows = vec![
            Row::with_identity("France", 1, "FRA", "year", 2000),
            Row::with_identity("France", 7, "FRA", "year", 2001),
        ];
        let result = Table::from_rows(TableSchema::new(TimeKind::Year), rows);
        assert!(matches!(
            result,
            Err(DataError::InconsistentEntity { entity_name }) if entity_name == "France"
        ));
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let schema = TableSchema::new(TimeKind::Year)
            .with_column(ColumnDef::new("1-gdp", ColumnKind::Number));
        let rows = vec![Row::with_identity("France", 1, "FRA", "year", 2000).with("1-gdp", "lots")];
        assert!(matches!(Table::from_rows(schema, rows), Err(DataError::Core(_))));
    }

    #[test]
    fn test_entity_maps() {
        let table = sample_table();
        assert_eq!(table.available_entity_names(), &["France".to_string(), "Chad".to_string()]);
        assert_eq!(table.entity_name_to_id_map()["Chad"], 2);
        assert_eq!(table.entity_name_to_code_map()["France"], "FRA");
        assert_eq!(table.entity_id_to_name_map()[&1], "France");
    }

    #[test]
    fn test_time_bounds() {
        let table = sample_table();
        assert_eq!(table.min_time(), Some(2000));
        assert_eq!(table.max_time(), Some(2005));
        assert_eq!(table.all_times(), vec![2000, 2001, 2003, 2005]);
        assert!(!table.has_day_column());

        let empty = Table::empty(TableSchema::new(TimeKind::Day)).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.min_time(), None);
        assert!(empty.has_day_column());
    }

    #[test]
    fn test_column_access() {
        let table = sample_table();
        assert!(table.has("1-gdp"));
        assert!(!table.has("3-missing"));
        assert!(table.get("1-gdp").is_ok());
        assert!(matches!(
            table.get_columns(&["1-gdp", "3-missing"]),
            Err(DataError::MissingColumn { slug }) if slug == "3-missing"
        ));
    }

    #[test]
    fn test_to_delimited() {
        let table = sample_table();
        let text = table.to_delimited(b',', Some(2)).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "entityName,entityId,entityCode,year,1-gdp,2-region");
        assert!(lines[1].starts_with("France,1,FRA,2000,10"));
    }

    #[test]
    fn test_describe() {
        let description = sample_table().describe(3).unwrap();
        assert!(description.starts_with("5 rows, 6 columns, 2 entities, year 2000 to 2005"));
        assert!(description.contains("lineage: from_rows"));
        assert!(description.contains("France"));
    }
}
