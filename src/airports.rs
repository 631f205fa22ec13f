//! City to IATA airport code resolution
//!
//! The table is data: an embedded default ships with the crate and a JSON
//! file with the same shape can replace it without code changes.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_TABLE: &str = include_str!("../data/airports.json");

#[derive(Debug, Clone, Deserialize)]
pub struct AirportTable {
    /// Uppercase three-letter tokens that are country abbreviations, not airports
    #[serde(default)]
    ignored_tokens: HashSet<String>,
    /// Lowercase city name to IATA code
    cities: BTreeMap<String, String>,
}

impl AirportTable {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut table: AirportTable =
            serde_json::from_str(json).with_context(|| "Failed to parse airport table")?;
        table.cities = table
            .cities
            .into_iter()
            .map(|(city, code)| (city.to_lowercase(), code.to_uppercase()))
            .collect();
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read airport table {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Resolve a location to an airport code, `None` when nothing matches
    #[must_use]
    pub fn resolve(&self, location: &str) -> Option<String> {
        self.explicit_code(location)
            .or_else(|| self.city_code(location))
    }

    /// A literal code written by the user, e.g. "JFK" or "Heathrow (LHR)"
    fn explicit_code(&self, location: &str) -> Option<String> {
        location
            .split(|c: char| !c.is_ascii_alphanumeric())
            .find(|token| {
                token.len() == 3
                    && token.chars().all(|c| c.is_ascii_uppercase())
                    && !self.ignored_tokens.contains(*token)
            })
            .map(str::to_string)
    }

    /// Longest city name contained in the location wins
    fn city_code(&self, location: &str) -> Option<String> {
        let location = location.to_lowercase();
        self.cities
            .iter()
            .filter(|(city, _)| location.contains(city.as_str()))
            .max_by_key(|(city, _)| city.len())
            .map(|(_, code)| code.clone())
    }
}

impl Default for AirportTable {
    fn default() -> Self {
        Self::from_json(DEFAULT_TABLE).expect("embedded airport table is valid JSON")
    }
}
