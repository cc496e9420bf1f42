//! Location subsystem for Skycast.
//!
//! Turns free text or coordinates into a named place through ordered
//! geocoding provider chains and a data-driven name normalizer.

pub mod normalizer;
pub mod providers;
pub mod resolver;
pub mod types;

pub use normalizer::{AliasTable, BoundingBox, NameRule, PlaceNameNormalizer, RegionRule, SubdivisionRule};
pub use providers::{build_chain, GeocodeProvider, NominatimGeocoder, OpenWeatherGeocoder, ProviderKind};
pub use resolver::LocationResolver;
pub use types::{GeocodeCandidate, GeocodeQuery, LocationQuery, PlaceSource, ResolvedPlace};
