//! Entity population side table
//!
//! Populations are supplied by the host once and only read afterwards.

use std::io::Read;
use std::path::Path;

use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::DataResult;

/// Population of an entity by name
pub trait PopulationLookup {
    fn population(&self, entity_name: &str) -> Option<f64>;
}

/// Read-only map from entity name to population
#[derive(Debug, Clone, Default)]
pub struct PopulationMap {
    populations: AHashMap<String, f64>,
}

impl PopulationMap {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            populations: pairs
                .into_iter()
                .map(|(name, population)| (name.into(), population))
                .collect(),
        }
    }

    /// From a JSON object of `{"entity name": population}`
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        let populations: IndexMap<String, f64> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(populations))
    }

    /// From `entity,population` CSV with a header line
    ///
    /// Rows whose population does not parse are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> DataResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut populations = AHashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let (Some(name), Some(raw)) = (record.get(0), record.get(1)) else {
                continue;
            };
            match raw.parse::<f64>() {
                Ok(population) => {
                    populations.insert(name.to_string(), population);
                }
                Err(_) => warn!("Skipping population {:?} for {}", raw, name),
            }
        }

        Ok(Self { populations })
    }

    /// Load from a `.csv` file, or JSON otherwise
    pub fn from_path(path: &Path) -> DataResult<Self> {
        let map = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            Self::from_csv_reader(std::fs::File::open(path)?)?
        } else {
            Self::from_json_str(&std::fs::read_to_string(path)?)?
        };
        info!("Loaded {} populations from {:?}", map.len(), path);
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.populations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }
}

impl PopulationLookup for PopulationMap {
    fn population(&self, entity_name: &str) -> Option<f64> {
        self.populations.get(entity_name).copied()
    }
}
