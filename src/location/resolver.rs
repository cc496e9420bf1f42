//! Location resolver: runs the forward and reverse provider chains.
//!
//! Text flow:        alias rewrite → forward chain → normalizer → match note
//! Coordinate flow:  reverse chain → normalizer (placeholder name if every provider fails)
//!
//! The first provider to return a candidate wins. Provider errors and
//! timeouts only advance the chain; they never reach the caller.

use super::normalizer::{AliasTable, PlaceNameNormalizer};
use super::providers::GeocodeProvider;
use super::types::{GeocodeCandidate, GeocodeQuery, LocationQuery, PlaceSource, ResolvedPlace};
use crate::error::Failure;
use tracing::{debug, info, warn};

pub const DEFAULT_PLACEHOLDER_NAME: &str = "Current Location";

/// Resolves a `LocationQuery` into a `ResolvedPlace`.
pub struct LocationResolver {
    forward: Vec<Box<dyn GeocodeProvider>>,
    reverse: Vec<Box<dyn GeocodeProvider>>,
    aliases: AliasTable,
    normalizer: PlaceNameNormalizer,
    placeholder_name: String,
}

impl LocationResolver {
    pub fn new(
        forward: Vec<Box<dyn GeocodeProvider>>,
        reverse: Vec<Box<dyn GeocodeProvider>>,
    ) -> Self {
        Self {
            forward,
            reverse,
            aliases: AliasTable::default(),
            normalizer: PlaceNameNormalizer::default(),
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
        }
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_normalizer(mut self, normalizer: PlaceNameNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_placeholder_name(mut self, name: impl Into<String>) -> Self {
        self.placeholder_name = name.into();
        self
    }

    pub fn resolve(&self, query: &LocationQuery) -> Result<ResolvedPlace, Failure> {
        query.validate()?;
        match query {
            LocationQuery::ByText { raw } => self.resolve_text(raw.trim()),
            LocationQuery::ByCoordinates { lat, lon } => Ok(self.resolve_coordinates(*lat, *lon)),
        }
    }

    fn resolve_text(&self, raw: &str) -> Result<ResolvedPlace, Failure> {
        let term = self.aliases.rewrite(raw);
        if term != raw {
            debug!(raw, term, "applied search alias");
        }

        let query = GeocodeQuery::Forward(term.to_string());
        let candidate = first_candidate(&self.forward, &query)
            .ok_or_else(|| Failure::location_not_found(raw))?;

        let display_name = self.normalizer.normalize(&candidate);
        let match_note = match_note(raw, &display_name);
        info!(raw, display_name = %display_name, source = %candidate.source, "resolved place name");

        Ok(ResolvedPlace {
            display_name,
            country: candidate.country,
            lat: candidate.lat,
            lon: candidate.lon,
            match_note,
            source: candidate.source,
        })
    }

    /// Coordinates are trusted as the location even when no provider can name them.
    fn resolve_coordinates(&self, lat: f64, lon: f64) -> ResolvedPlace {
        let query = GeocodeQuery::Reverse { lat, lon };
        let candidate = first_candidate(&self.reverse, &query).unwrap_or_else(|| {
            warn!(lat, lon, "reverse geocoding chain exhausted; using placeholder name");
            GeocodeCandidate {
                name: self.placeholder_name.clone(),
                country: None,
                admin_area: None,
                lat,
                lon,
                source: PlaceSource::Placeholder,
            }
        });

        let display_name = self.normalizer.normalize(&candidate);
        info!(lat, lon, display_name = %display_name, source = %candidate.source, "resolved coordinates");

        ResolvedPlace {
            display_name,
            country: candidate.country,
            lat,
            lon,
            match_note: None,
            source: candidate.source,
        }
    }
}

fn first_candidate(
    chain: &[Box<dyn GeocodeProvider>],
    query: &GeocodeQuery,
) -> Option<GeocodeCandidate> {
    chain.iter().find_map(|provider| match provider.lookup(query) {
        Ok(Some(candidate)) => {
            debug!(provider = provider.name(), %query, name = %candidate.name, "provider answered");
            Some(candidate)
        }
        Ok(None) => {
            debug!(provider = provider.name(), %query, "provider returned no candidate");
            None
        }
        Err(e) => {
            warn!(provider = provider.name(), %query, error = %e, "provider failed");
            None
        }
    })
}

/// Explain a resolved name that is neither the user's text nor contains/is contained by it.
fn match_note(raw: &str, resolved: &str) -> Option<String> {
    let raw_l = raw.to_lowercase();
    let resolved_l = resolved.to_lowercase();
    if raw_l == resolved_l || resolved_l.contains(&raw_l) || raw_l.contains(&resolved_l) {
        return None;
    }
    Some(format!("Results for {} (nearest match to '{}')", resolved, raw))
}
