//! Markers that stand for a missing observation in ingested values

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Null marker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NullConfig {
    /// String values treated as absent
    pub patterns: Vec<String>,

    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,

    /// Case sensitive matching
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                String::new(),
                "N/A".to_string(),
                "NA".to_string(),
                "null".to_string(),
                "None".to_string(),
                "..".to_string(),
            ],
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// Configuration with exactly the given markers
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Check if a string should be treated as absent
    pub fn is_null(&self, value: &str) -> bool {
        let test_value = if self.trim_whitespace {
            value.trim()
        } else {
            value
        };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                test_value == pattern
            } else {
                test_value.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Check a raw JSON observation; JSON `null` is always absent
    pub fn is_null_value(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => self.is_null(s),
            _ => false,
        }
    }

    /// Add a marker unless already present
    pub fn add_pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}
