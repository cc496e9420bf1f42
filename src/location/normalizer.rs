//! Place-name heuristics.
//!
//! Providers often name a place by an administrative subdivision or by an
//! obscure local rendering. The normalizer runs a small ordered rule table
//! over each candidate; the first rule that produces a name wins, otherwise
//! the provider's name passes through unchanged.

use super::types::GeocodeCandidate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inclusive latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lon)
    }

    pub fn is_well_formed(&self) -> bool {
        [self.south, self.north, self.west, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.south <= self.north
            && self.west <= self.east
    }
}

/// Subdivision names that should be shown together with their parent city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdivisionRule {
    pub parent: String,
    pub names: Vec<String>,
}

/// A locality whose name providers render inconsistently inside its box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRule {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(flatten)]
    pub bounds: BoundingBox,
}

/// One entry of the ordered rule table.
#[derive(Debug, Clone, PartialEq)]
pub enum NameRule {
    /// "District" becomes "District, Parent".
    Subdivision(SubdivisionRule),
    /// Inside the box, names not mentioning the locality become its canonical name.
    Region(RegionRule),
}

impl NameRule {
    /// Returns the replacement display name if this rule applies.
    pub fn apply(&self, candidate: &GeocodeCandidate) -> Option<String> {
        match self {
            Self::Subdivision(rule) => {
                let name = candidate.name.trim();
                let is_member = rule.names.iter().any(|n| n.eq_ignore_ascii_case(name));
                if !is_member || contains_ignore_case(name, &rule.parent) {
                    return None;
                }
                Some(format!("{}, {}", name, rule.parent))
            }
            Self::Region(rule) => {
                if !rule.bounds.contains(candidate.lat, candidate.lon) {
                    return None;
                }
                let already_named = std::iter::once(&rule.canonical)
                    .chain(rule.aliases.iter())
                    .any(|n| contains_ignore_case(&candidate.name, n));
                if already_named {
                    return None;
                }
                Some(rule.canonical.clone())
            }
        }
    }
}

/// Runs the rule table over candidates.
#[derive(Debug, Clone, Default)]
pub struct PlaceNameNormalizer {
    rules: Vec<NameRule>,
}

impl PlaceNameNormalizer {
    pub fn new(rules: Vec<NameRule>) -> Self {
        Self { rules }
    }

    /// Subdivision rules are evaluated before region rules.
    pub fn from_tables(subdivisions: &[SubdivisionRule], regions: &[RegionRule]) -> Self {
        let rules = subdivisions
            .iter()
            .cloned()
            .map(NameRule::Subdivision)
            .chain(regions.iter().cloned().map(NameRule::Region))
            .collect();
        Self { rules }
    }

    pub fn normalize(&self, candidate: &GeocodeCandidate) -> String {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(candidate))
            .unwrap_or_else(|| candidate.name.clone())
    }
}

/// Case-insensitive exact-match rewrite of user search terms.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (alias_key(k.as_ref()), v.into()))
            .collect();
        Self { entries }
    }

    /// The replacement term, or the input unchanged.
    pub fn rewrite<'a>(&'a self, term: &'a str) -> &'a str {
        self.entries
            .get(&alias_key(term))
            .map(String::as_str)
            .unwrap_or(term)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn alias_key(term: &str) -> String {
    term.trim().to_lowercase()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
