//! Row representation used at the edges of a table

use dv_core::{slugs, CellValue, Time};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from column slug to value; absent keys are missing values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, CellValue>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row carrying the identity columns
    pub fn with_identity(
        entity_name: &str,
        entity_id: i64,
        entity_code: &str,
        time_slug: &str,
        time: Time,
    ) -> Self {
        let mut row = Self::new();
        row.insert(slugs::ENTITY_NAME, CellValue::from(entity_name));
        row.insert(slugs::ENTITY_ID, CellValue::Int(entity_id));
        row.insert(slugs::ENTITY_CODE, CellValue::from(entity_code));
        row.insert(time_slug, CellValue::Int(time));
        row
    }

    pub fn insert(&mut self, slug: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(slug.into(), value.into());
    }

    /// Builder form of [`Row::insert`]
    pub fn with(mut self, slug: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(slug, value);
        self
    }

    pub fn get(&self, slug: &str) -> Option<&CellValue> {
        self.0.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.0.contains_key(slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> + '_ {
        self.0.iter().map(|(slug, value)| (slug.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.get(slugs::ENTITY_NAME).and_then(CellValue::as_str)
    }

    pub fn entity_id(&self) -> Option<i64> {
        self.get(slugs::ENTITY_ID).and_then(CellValue::as_i64)
    }

    pub fn time(&self, time_slug: &str) -> Option<Time> {
        self.get(time_slug).and_then(CellValue::as_i64)
    }

    /// Field union; values of `other` win on key collisions
    pub fn merge(&mut self, other: Row) {
        self.0.extend(other.0);
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
