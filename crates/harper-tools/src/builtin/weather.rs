//! Weather lookup tool backed by Open-Meteo

use super::parse_params;
use crate::Tool;
use async_trait::async_trait;
use harper_core::{Error, Result};
use harper_llm::tools::schema;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

const NAME: &str = "weather_lookup";
const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Current weather for a named place (no API key required)
pub struct WeatherTool {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    #[serde(alias = "location", alias = "input")]
    city: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: u8,
}

/// Weather report returned to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    /// Resolved place name
    pub location: String,
    /// Air temperature at 2 m
    pub temperature_c: f64,
    /// Relative humidity at 2 m
    pub humidity_pct: f64,
    /// Wind speed at 10 m
    pub wind_kmh: f64,
    /// Human-readable conditions
    pub conditions: &'static str,
}

impl WeatherTool {
    /// Create the tool against the public Open-Meteo endpoints
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            geocoding_url: GEOCODING_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
        }
    }

    /// Override the endpoints
    pub fn with_endpoints(
        mut self,
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Self {
        self.geocoding_url = geocoding_url.into();
        self.forecast_url = forecast_url.into();
        self
    }

    async fn lookup(&self, city: &str) -> std::result::Result<WeatherReport, String> {
        let geo: GeocodingResponse = self
            .client
            .get(&self.geocoding_url)
            .query(&[("name", city), ("count", "1")])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| format!("Geocoding request failed: {e}"))?
            .json()
            .await
            .map_err(|e| format!("Invalid geocoding response: {e}"))?;

        let place = geo
            .results
            .into_iter()
            .next()
            .ok_or_else(|| format!("Unknown location: {city}"))?;

        debug!(
            place = %place.name,
            latitude = place.latitude,
            longitude = place.longitude,
            "Resolved location"
        );

        let forecast: ForecastResponse = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code".to_string(),
                ),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| format!("Forecast request failed: {e}"))?
            .json()
            .await
            .map_err(|e| format!("Invalid forecast response: {e}"))?;

        Ok(build_report(place, &forecast.current))
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

fn build_report(place: Place, current: &CurrentConditions) -> WeatherReport {
    let location = match place.country {
        Some(country) => format!("{}, {country}", place.name),
        None => place.name,
    };

    WeatherReport {
        location,
        temperature_c: current.temperature_2m,
        humidity_pct: current.relative_humidity_2m,
        wind_kmh: current.wind_speed_10m,
        conditions: describe_weather_code(current.weather_code),
    }
}

/// WMO weather interpretation codes
fn describe_weather_code(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[async_trait]
impl Tool for WeatherTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: WeatherParams = parse_params(NAME, params)?;
        let city = params.city.trim();
        if city.is_empty() {
            return Err(Error::tool(NAME, "City must not be empty"));
        }

        let report = self.lookup(city).await.map_err(|msg| Error::tool(NAME, msg))?;
        serde_json::to_value(report).map_err(|e| Error::tool(NAME, e.to_string()))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Get the current weather for a city. Input should be a city name."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "city": schema::string("City name, e.g. 'Paris'"),
            }),
            &["city"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_codes() {
        assert_eq!(describe_weather_code(0), "Clear sky");
        assert_eq!(describe_weather_code(63), "Rain");
        assert_eq!(describe_weather_code(81), "Rain showers");
        assert_eq!(describe_weather_code(99), "Thunderstorm with hail");
        assert_eq!(describe_weather_code(42), "Unknown");
    }

    #[test]
    fn test_build_report() {
        let geo: GeocodingResponse = serde_json::from_value(json!({
            "results": [{"name": "Paris", "latitude": 48.85, "longitude": 2.35, "country": "France"}]
        }))
        .unwrap();
        let forecast: ForecastResponse = serde_json::from_value(json!({
            "current": {
                "time": "2025-03-14T12:00",
                "temperature_2m": 14.2,
                "relative_humidity_2m": 61.0,
                "wind_speed_10m": 9.7,
                "weather_code": 2
            }
        }))
        .unwrap();

        let place = geo.results.into_iter().next().unwrap();
        let report = build_report(place, &forecast.current);
        assert_eq!(report.location, "Paris, France");
        assert_eq!(report.conditions, "Partly cloudy");

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["temperature_c"], 14.2);
        assert_eq!(value["wind_kmh"], 9.7);
    }

    #[tokio::test]
    async fn test_blank_city_rejected() {
        let err = WeatherTool::new().execute(json!({"location": " "})).await.unwrap_err();
        assert!(matches!(err, Error::ToolExecution { ref tool, .. } if tool == "weather_lookup"));
    }

    #[tokio::test]
    async fn test_unreachable_geocoder() {
        let tool = WeatherTool::new()
            .with_endpoints("http://127.0.0.1:9/search", "http://127.0.0.1:9/forecast");
        let err = tool.execute(json!("Paris")).await.unwrap_err();
        assert!(err.to_string().contains("Geocoding request failed"));
    }
}
