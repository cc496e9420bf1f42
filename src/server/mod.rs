mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::pipeline::WeatherPipeline;

pub use handlers::{ApiError, WeatherParams};

pub fn build_router(pipeline: WeatherPipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/api/weather", get(handlers::weather))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(pipeline: WeatherPipeline, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(pipeline);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "skycast server listening");
    eprintln!("  Skycast server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::location::{GeocodeCandidate, GeocodeProvider, GeocodeQuery, LocationResolver, PlaceSource};
    use crate::weather::{CurrentConditions, CurrentReading, ForecastSample, WeatherFetcher, WeatherSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    struct OnePlace;

    impl GeocodeProvider for OnePlace {
        fn name(&self) -> &'static str {
            "one-place"
        }

        fn lookup(&self, query: &GeocodeQuery) -> Result<Option<GeocodeCandidate>, ProviderError> {
            match query {
                GeocodeQuery::Forward(term) if term == "Nairobi" => Ok(Some(GeocodeCandidate {
                    name: "Nairobi".into(),
                    country: Some("KE".into()),
                    admin_area: None,
                    lat: -1.29,
                    lon: 36.82,
                    source: PlaceSource::OpenWeatherMap,
                })),
                _ => Ok(None),
            }
        }
    }

    struct Sunny;

    impl WeatherSource for Sunny {
        fn current(&self, _lat: f64, _lon: f64) -> Result<CurrentReading, ProviderError> {
            Ok(CurrentReading {
                conditions: CurrentConditions {
                    temperature: 24.0,
                    feels_like: 24.5,
                    condition_text: "Clear sky".into(),
                    humidity_pct: 40,
                    wind_kph: 10.8,
                    pressure_hpa: 1015.0,
                    visibility_km: 10.0,
                    icon_code: "01d".into(),
                    observed_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
                },
                country: Some("KE".into()),
            })
        }

        fn forecast(&self, _lat: f64, _lon: f64) -> Result<Vec<ForecastSample>, ProviderError> {
            Ok(Vec::new())
        }
    }

    struct Offline;

    impl WeatherSource for Offline {
        fn current(&self, _lat: f64, _lon: f64) -> Result<CurrentReading, ProviderError> {
            Err(ProviderError::Status(500))
        }

        fn forecast(&self, _lat: f64, _lon: f64) -> Result<Vec<ForecastSample>, ProviderError> {
            Err(ProviderError::Status(500))
        }
    }

    fn pipeline_with(api_key: Option<&str>, source: Box<dyn WeatherSource>) -> WeatherPipeline {
        let resolver = LocationResolver::new(vec![Box::new(OnePlace)], Vec::new());
        WeatherPipeline::new(
            api_key.map(String::from),
            resolver,
            WeatherFetcher::new(source),
            chrono_tz::Tz::UTC,
        )
    }

    fn pipeline(api_key: Option<&str>) -> WeatherPipeline {
        pipeline_with(api_key, Box::new(Sunny))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value, Option<String>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let cache = response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), cache)
    }

    #[tokio::test]
    async fn test_weather_ok() {
        let (status, body, cache) =
            get_json(build_router(pipeline(Some("k"))), "/api/weather?city=Nairobi").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["place"]["display_name"], "Nairobi");
        assert_eq!(body["current"]["condition_text"], "Clear sky");
        assert_eq!(cache.as_deref(), Some("no-store"));
    }

    #[tokio::test]
    async fn test_missing_input_is_400() {
        let (status, body, _) =
            get_json(build_router(pipeline(Some("k"))), "/api/weather?city=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "input_invalid");
        assert_eq!(body["fallback"], "fix_input");
    }

    #[tokio::test]
    async fn test_missing_key_is_503() {
        let (status, body, _) =
            get_json(build_router(pipeline(None)), "/api/weather?city=Nairobi").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "api_key_missing");
        assert_eq!(body["code"], 503);
    }

    #[tokio::test]
    async fn test_unknown_city_is_404_with_raw_query() {
        let (status, body, _) =
            get_json(build_router(pipeline(Some("k"))), "/api/weather?city=Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["raw_query"], "Atlantis");
        assert_eq!(body["fallback"], "retry_with_device_location");
    }

    #[tokio::test]
    async fn test_coordinates_win_over_city() {
        let (status, body, _) = get_json(
            build_router(pipeline(Some("k"))),
            "/api/weather?city=Atlantis&lat=9.41&lon=42.03",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["place"]["display_name"], "Current Location");
        assert_eq!(body["place"]["country"], "KE");
    }

    #[tokio::test]
    async fn test_weather_outage_is_502_with_stage() {
        let app = build_router(pipeline_with(Some("k"), Box::new(Offline)));
        let (status, body, _) = get_json(app, "/api/weather?city=Nairobi").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], 502);
        assert_eq!(body["kind"], "upstream_unavailable");
        assert_eq!(body["stage"], "current");
        assert_eq!(body["fallback"], "retry_later");
        assert!(body.get("raw_query").is_none());
    }

    #[tokio::test]
    async fn test_bad_latitude_is_400() {
        let (status, _, _) =
            get_json(build_router(pipeline(Some("k"))), "/api/weather?lat=95&lon=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
