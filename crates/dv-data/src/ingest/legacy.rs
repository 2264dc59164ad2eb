//! Legacy per-variable input format

use std::io::Read;

use dv_core::{Time, TimeKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DataError, DataResult};

/// Variables keyed by id plus the entities they refer to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyVariablesAndEntityKey {
    #[serde(default)]
    pub variables: IndexMap<String, LegacyVariable>,
    #[serde(default)]
    pub entity_key: IndexMap<String, LegacyEntityMeta>,
}

impl LegacyVariablesAndEntityKey {
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> DataResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Entity metadata for a numeric id
    pub fn entity(&self, id: i64) -> Option<&LegacyEntityMeta> {
        self.entity_key.get(&id.to_string())
    }
}

/// Identity of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEntityMeta {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// One variable with parallel arrays of observations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyVariable {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub short_unit: Option<String>,
    pub display: LegacyVariableDisplayConfig,
    pub years: Option<Vec<Time>>,
    pub days: Option<Vec<Time>>,
    pub entities: Vec<i64>,
    pub values: Vec<Value>,
}

impl LegacyVariable {
    /// Time kind and raw time coordinates of the observations
    ///
    /// `days` always means day-based; `years` does when the display config
    /// sets `yearIsDay`.
    pub fn times(&self) -> DataResult<(TimeKind, &[Time])> {
        match (&self.years, &self.days) {
            (Some(_), Some(_)) => Err(DataError::malformed(self.id, "both years and days given")),
            (None, Some(days)) => Ok((TimeKind::Day, days)),
            (Some(years), None) if self.display.year_is_day.unwrap_or(false) => {
                Ok((TimeKind::Day, years))
            }
            (Some(years), None) => Ok((TimeKind::Year, years)),
            (None, None) if self.display.year_is_day.unwrap_or(false) => Ok((TimeKind::Day, &[])),
            (None, None) => Ok((TimeKind::Year, &[])),
        }
    }
}

/// Author display settings of a variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyVariableDisplayConfig {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub short_unit: Option<String>,
    pub conversion_factor: Option<f64>,
    pub num_decimal_places: Option<usize>,
    pub tolerance: Option<Time>,
    pub year_is_day: Option<bool>,
    pub zero_day: Option<String>,
}
