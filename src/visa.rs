//! Mock visa requirements lookup
//!
//! A small citizenship to visa-free-destination table. Results are always
//! tagged `mock`: nothing here reflects real entry rules.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{Provenance, VisaResult};

const DEFAULT_RULES: &str = include_str!("../data/visa_rules.json");

#[derive(Debug, Clone, Deserialize)]
struct VisaRule {
    citizenships: Vec<String>,
    stay_limit: String,
    visa_free: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisaRules {
    default_documents: Vec<String>,
    visa_free_documents: Vec<String>,
    rules: Vec<VisaRule>,
}

impl VisaRules {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut rules: VisaRules =
            serde_json::from_str(json).with_context(|| "Failed to parse visa rules")?;
        for rule in &mut rules.rules {
            rule.citizenships.iter_mut().for_each(|c| *c = c.to_lowercase());
            rule.visa_free.iter_mut().for_each(|d| *d = d.to_lowercase());
        }
        Ok(rules)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read visa rules {}", path.display()))?;
        Self::from_json(&json)
    }

    fn rule_for(&self, citizenship: &str) -> Option<&VisaRule> {
        let citizenship = citizenship.trim().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.citizenships.iter().any(|name| *name == citizenship))
            .or_else(|| {
                // "United States of America", "german national"
                self.rules.iter().find(|rule| {
                    rule.citizenships
                        .iter()
                        .any(|name| contains_words(&citizenship, name))
                })
            })
    }

    /// Look up whether `citizenship` needs a visa for `destination`
    #[must_use]
    pub fn lookup(&self, citizenship: &str, destination: &str) -> VisaResult {
        let country = destination_country(destination);
        let visa_free = self.rule_for(citizenship).filter(|rule| {
            !country.is_empty()
                && rule
                    .visa_free
                    .iter()
                    .any(|entry| contains_words(&country, entry))
        });

        match visa_free {
            Some(rule) => VisaResult {
                required: false,
                visa_type: Some("Visa-free entry".to_string()),
                processing_time: None,
                documents: self.visa_free_documents.clone(),
                notes: Some(format!(
                    "{} travellers can usually visit {} without a visa for {}.",
                    citizenship.trim(),
                    destination.trim(),
                    rule.stay_limit
                )),
                provenance: Provenance::Mock,
                error_detail: None,
            },
            None => VisaResult {
                required: true,
                visa_type: Some("Tourist visa".to_string()),
                processing_time: Some("2-6 weeks".to_string()),
                documents: self.default_documents.clone(),
                notes: Some(format!(
                    "No visa-free arrangement is known for {} travellers to {}. Apply through the destination's embassy or e-visa portal.",
                    citizenship.trim(),
                    destination.trim()
                )),
                provenance: Provenance::Mock,
                error_detail: None,
            },
        }
    }
}

impl Default for VisaRules {
    fn default() -> Self {
        Self::from_json(DEFAULT_RULES).expect("embedded visa rules are valid JSON")
    }
}

/// Trailing comma-separated token, taken as the country name
fn destination_country(destination: &str) -> String {
    destination
        .rsplit(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .map(|word| word.trim_matches('.'))
        .filter(|word| !word.is_empty())
        .collect()
}

/// Whether the words of `needle` occur as a contiguous run of whole words in
/// `haystack`; "in" does not match "finland"
fn contains_words(haystack: &str, needle: &str) -> bool {
    let needle = words(needle);
    !needle.is_empty()
        && words(haystack)
            .windows(needle.len())
            .any(|window| window == needle.as_slice())
}
