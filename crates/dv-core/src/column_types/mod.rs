//! Column type registry
//!
//! Every column of a table declares one [`ColumnKind`]. The kind decides how
//! raw input is parsed, how values are coerced into the column's domain, how
//! they are displayed, and which arrow type stores them.

mod format;

use std::fmt;

use arrow::datatypes::DataType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::Time;
use crate::CoreError;

pub use format::{days_between, format_day, format_number, format_year, group_thousands, parse_date};

/// Day zero of day-based time columns
pub const EPOCH_DATE: &str = "2020-01-21";

/// Canonical slugs of the identity columns every row carries
pub mod slugs {
    pub const ENTITY_NAME: &str = "entityName";
    pub const ENTITY_ID: &str = "entityId";
    pub const ENTITY_CODE: &str = "entityCode";
    pub const YEAR: &str = "year";
    pub const DAY: &str = "day";
}

/// The default epoch as a calendar date
pub fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 21).unwrap_or_default()
}

/// A single cell of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Number(v) => Some(*v),
            CellValue::Text(_) => None,
        }
    }

    /// Integer view of the value; floats only qualify when they are whole
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(v) => Some(*v),
            CellValue::Number(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// String view of the value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, CellValue::Text(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Time coordinate kind of a table; a table uses exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeKind {
    Year,
    Day,
}

impl TimeKind {
    /// Slug of the time column
    pub fn slug(&self) -> &'static str {
        match self {
            TimeKind::Year => slugs::YEAR,
            TimeKind::Day => slugs::DAY,
        }
    }

    pub fn column_kind(&self) -> ColumnKind {
        match self {
            TimeKind::Year => ColumnKind::Year,
            TimeKind::Day => ColumnKind::Day,
        }
    }
}

/// Column kinds known to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Floating point measurements
    Number,
    /// Free text / categorical values
    String,
    /// Calendar year, negative for BCE
    Year,
    /// Day offset from the epoch date
    Day,
    EntityName,
    EntityId,
    EntityCode,
}

/// Display options handed to [`ColumnKind::format`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatOptions {
    /// Decimal places for numeric values
    pub num_decimal_places: usize,
    /// Drop trailing zeroes after the decimal point
    pub no_trailing_zeroes: bool,
    /// Unit appended to numeric values
    pub unit: Option<String>,
    /// Day zero for day-based values
    pub epoch: NaiveDate,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            num_decimal_places: 2,
            no_trailing_zeroes: true,
            unit: None,
            epoch: epoch_date(),
        }
    }
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 7] = [
        ColumnKind::Number,
        ColumnKind::String,
        ColumnKind::Year,
        ColumnKind::Day,
        ColumnKind::EntityName,
        ColumnKind::EntityId,
        ColumnKind::EntityCode,
    ];

    /// Human-readable kind name
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Number => "Number",
            ColumnKind::String => "String",
            ColumnKind::Year => "Year",
            ColumnKind::Day => "Day",
            ColumnKind::EntityName => "EntityName",
            ColumnKind::EntityId => "EntityId",
            ColumnKind::EntityCode => "EntityCode",
        }
    }

    /// Canonical slug for identity and time kinds
    pub fn slug(&self) -> Option<&'static str> {
        match self {
            ColumnKind::Year => Some(slugs::YEAR),
            ColumnKind::Day => Some(slugs::DAY),
            ColumnKind::EntityName => Some(slugs::ENTITY_NAME),
            ColumnKind::EntityId => Some(slugs::ENTITY_ID),
            ColumnKind::EntityCode => Some(slugs::ENTITY_CODE),
            ColumnKind::Number | ColumnKind::String => None,
        }
    }

    pub fn is_time(&self) -> bool {
        matches!(self, ColumnKind::Year | ColumnKind::Day)
    }

    pub fn is_entity(&self) -> bool {
        matches!(
            self,
            ColumnKind::EntityName | ColumnKind::EntityId | ColumnKind::EntityCode
        )
    }

    /// Whether values of this kind are stored as numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnKind::Number | ColumnKind::Year | ColumnKind::Day | ColumnKind::EntityId
        )
    }

    /// Arrow storage type
    pub fn arrow_type(&self) -> DataType {
        match self {
            ColumnKind::Number => DataType::Float64,
            ColumnKind::Year | ColumnKind::Day | ColumnKind::EntityId => DataType::Int64,
            ColumnKind::String | ColumnKind::EntityName | ColumnKind::EntityCode => DataType::Utf8,
        }
    }

    /// Tolerance used when a column declares none
    pub fn default_tolerance(&self) -> Time {
        0
    }

    /// Parse raw text into this kind's value domain
    pub fn parse(&self, raw: &str) -> Result<CellValue, CoreError> {
        let invalid = || CoreError::InvalidValue {
            kind: *self,
            raw: raw.to_string(),
        };

        match self {
            ColumnKind::Number => raw
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .map_err(|_| invalid()),
            ColumnKind::Year | ColumnKind::Day | ColumnKind::EntityId => raw
                .trim()
                .parse::<i64>()
                .map(CellValue::Int)
                .map_err(|_| invalid()),
            ColumnKind::String | ColumnKind::EntityName | ColumnKind::EntityCode => {
                Ok(CellValue::Text(raw.to_string()))
            }
        }
    }

    /// Convert an already typed value into this kind's value domain
    pub fn coerce(&self, value: CellValue) -> Result<CellValue, CoreError> {
        match (self, value) {
            (ColumnKind::Number, CellValue::Int(v)) => Ok(CellValue::Number(v as f64)),
            (ColumnKind::Number, CellValue::Number(v)) => Ok(CellValue::Number(v)),
            (ColumnKind::Year | ColumnKind::Day | ColumnKind::EntityId, value @ CellValue::Number(_)) => {
                value.as_i64().map(CellValue::Int).ok_or_else(|| CoreError::InvalidValue {
                    kind: *self,
                    raw: value.to_string(),
                })
            }
            (ColumnKind::Year | ColumnKind::Day | ColumnKind::EntityId, CellValue::Int(v)) => {
                Ok(CellValue::Int(v))
            }
            (_, CellValue::Text(s)) => self.parse(&s),
            (ColumnKind::String | ColumnKind::EntityName | ColumnKind::EntityCode, value) => {
                Ok(CellValue::Text(value.to_string()))
            }
        }
    }

    /// Display string for a value of this kind
    pub fn format(&self, value: &CellValue, options: &FormatOptions) -> String {
        match self {
            ColumnKind::Number => match value.as_f64() {
                Some(v) => {
                    let mut out =
                        format_number(v, options.num_decimal_places, options.no_trailing_zeroes);
                    if let Some(unit) = options.unit.as_deref().filter(|u| !u.is_empty()) {
                        if unit != "%" {
                            out.push(' ');
                        }
                        out.push_str(unit);
                    }
                    out
                }
                None => value.to_string(),
            },
            ColumnKind::Year => match value.as_i64() {
                Some(year) => format_year(year),
                None => value.to_string(),
            },
            ColumnKind::Day => match value.as_i64() {
                Some(day) => format_day(day, options.epoch),
                None => value.to_string(),
            },
            ColumnKind::String
            | ColumnKind::EntityName
            | ColumnKind::EntityId
            | ColumnKind::EntityCode => value.to_string(),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
