//! Ingestion configuration

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use dv_core::column_types::{epoch_date, parse_date};
use dv_core::Time;
use serde::{Deserialize, Serialize};

use super::null_handling::NullConfig;
use crate::DataResult;

/// Display overrides for a single column, keyed by slug in [`IngestConfig`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnOverride {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub num_decimal_places: Option<usize>,
    pub tolerance: Option<Time>,
}

/// Configuration for turning legacy variables into a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestConfig {
    /// Markers for absent string observations
    pub null_values: NullConfig,

    /// Day zero for day-based variables, ISO `YYYY-MM-DD`
    pub epoch: Option<String>,

    /// Multiply numeric values by the variable's conversion factor
    pub apply_conversion_factor: bool,

    /// Per-column display overrides
    pub column_overrides: HashMap<String, ColumnOverride>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            null_values: NullConfig::default(),
            epoch: None,
            apply_conversion_factor: true,
            column_overrides: HashMap::new(),
        }
    }
}

impl IngestConfig {
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> DataResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The configured epoch, or the default one
    pub fn epoch_date(&self) -> DataResult<NaiveDate> {
        match self.epoch.as_deref() {
            Some(raw) => Ok(parse_date(raw)?),
            None => Ok(epoch_date()),
        }
    }

    pub fn column_override(&self, slug: &str) -> Option<&ColumnOverride> {
        self.column_overrides.get(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert!(config.apply_conversion_factor);
        assert_eq!(config.epoch_date().unwrap(), epoch_date());
    }

    #[test]
    fn test_from_json() {
        let config = IngestConfig::from_json_str(
            r#"{
                "epoch": "2020-01-01",
                "applyConversionFactor": false,
                "columnOverrides": { "3-gdp": { "tolerance": 5, "unit": "$" } }
            }"#,
        )
        .unwrap();

        assert!(!config.apply_conversion_factor);
        assert_eq!(
            config.epoch_date().unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        let column = config.column_override("3-gdp").unwrap();
        assert_eq!(column.tolerance, Some(5));
        assert_eq!(column.unit.as_deref(), Some("$"));
        assert!(config.null_values.is_null("N/A"));
    }

    #[test]
    fn test_bad_epoch() {
        let config = IngestConfig {
            epoch: Some("yesterday".to_string()),
            ..IngestConfig::default()
        };
        assert!(config.epoch_date().is_err());
    }
}
