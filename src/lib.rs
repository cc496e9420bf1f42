//! Skycast: place-name or coordinate input in, current conditions and a
//! condensed five-day forecast out.

pub mod config;
pub mod error;
pub mod location;
pub mod pipeline;
pub mod result;
pub mod server;
pub mod weather;

pub use config::SkycastConfig;
pub use error::{ConfigError, FallbackHint, Failure, Stage};
pub use location::{LocationQuery, ResolvedPlace};
pub use pipeline::WeatherPipeline;
pub use result::WeatherResult;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
