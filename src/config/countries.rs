// src/config/countries.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};

const DEFAULT_COUNTRIES: [(&str, &str); 10] = [
    ("ARG", "Argentina"),
    ("BOL", "Bolivia"),
    ("BRA", "Brasil"),
    ("CHL", "Chile"),
    ("COL", "Colombia"),
    ("CRI", "Costa Rica"),
    ("ECU", "Ecuador"),
    ("MEX", "México"),
    ("PER", "Perú"),
    ("URY", "Uruguay"),
];

/// Closed allow-list of country codes and their display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCatalog(BTreeMap<String, String>);

impl Default for CountryCatalog {
    fn default() -> Self {
        DEFAULT_COUNTRIES
            .iter()
            .map(|(c, n)| (c.to_string(), n.to_string()))
            .collect()
    }
}

impl FromIterator<(String, String)> for CountryCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        CountryCatalog(iter.into_iter().collect())
    }
}

impl CountryCatalog {
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Codes must be three ASCII uppercase letters and every name non-blank.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "country catalog is empty".into(),
            ));
        }
        for (code, name) in &self.0 {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "country code `{}` is not a 3-letter uppercase code",
                    code
                )));
            }
            if name.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "country `{}` has a blank display name",
                    code
                )));
            }
        }
        Ok(())
    }
}
