//! Shapes returned by [`WeatherClient`](crate::WeatherClient).
//!
//! Upstream timelines are flattened into plain sequences that keep only the
//! metrics a display needs. Metrics missing from the payload are `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Realtime conditions, passed through with every metric the API sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub data: CurrentData,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentData {
    pub time: String,
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl CurrentWeather {
    /// Numeric metric by its API name, e.g. `"temperatureApparent"`.
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.data.values.get(metric).and_then(Value::as_f64)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.value("temperature")
    }

    pub fn weather_code(&self) -> Option<u32> {
        self.data.values.get("weatherCode").and_then(Value::as_u64).and_then(|c| u32::try_from(c).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    pub time: String,
    pub temperature: Option<f64>,
    pub weather_code: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub time: String,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub weather_code: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub location: Location,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyHistory {
    pub time: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHistory {
    pub time: String,
    pub temperature_avg: Option<f64>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub humidity_avg: Option<f64>,
    pub wind_speed_avg: Option<f64>,
    pub precipitation_sum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBundle {
    pub location: Location,
    pub hourly: Vec<HourlyHistory>,
    pub daily: Vec<DailyHistory>,
}

// Upstream timeline payload (forecast and recent history share it).

#[derive(Debug, Deserialize)]
pub(crate) struct TmTimelinesResponse {
    timelines: TmTimelines,
    #[serde(default)]
    location: Location,
}

#[derive(Debug, Deserialize)]
struct TmTimelines {
    #[serde(default)]
    hourly: Vec<TmInterval>,
    #[serde(default)]
    daily: Vec<TmInterval>,
}

#[derive(Debug, Deserialize)]
struct TmInterval {
    time: String,
    #[serde(default)]
    values: TmValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TmValues {
    temperature: Option<f64>,
    temperature_max: Option<f64>,
    temperature_min: Option<f64>,
    temperature_avg: Option<f64>,
    humidity: Option<f64>,
    humidity_avg: Option<f64>,
    wind_speed: Option<f64>,
    wind_speed_avg: Option<f64>,
    precipitation_intensity: Option<f64>,
    precipitation_sum: Option<f64>,
    weather_code: Option<u32>,
}

impl From<TmTimelinesResponse> for ForecastBundle {
    fn from(raw: TmTimelinesResponse) -> Self {
        let hourly = raw
            .timelines
            .hourly
            .into_iter()
            .map(|h| HourlyForecast {
                time: h.time,
                temperature: h.values.temperature,
                weather_code: h.values.weather_code,
            })
            .collect();

        let daily = raw
            .timelines
            .daily
            .into_iter()
            .map(|d| DailyForecast {
                time: d.time,
                temperature_max: d.values.temperature_max,
                temperature_min: d.values.temperature_min,
                weather_code: d.values.weather_code,
            })
            .collect();

        Self { location: raw.location, hourly, daily }
    }
}

impl From<TmTimelinesResponse> for HistoryBundle {
    fn from(raw: TmTimelinesResponse) -> Self {
        let hourly = raw
            .timelines
            .hourly
            .into_iter()
            .map(|h| HourlyHistory {
                time: h.time,
                temperature: h.values.temperature,
                humidity: h.values.humidity,
                wind_speed: h.values.wind_speed,
                precipitation: h.values.precipitation_intensity,
                weather_code: h.values.weather_code,
            })
            .collect();

        let daily = raw
            .timelines
            .daily
            .into_iter()
            .map(|d| DailyHistory {
                time: d.time,
                temperature_avg: d.values.temperature_avg,
                temperature_max: d.values.temperature_max,
                temperature_min: d.values.temperature_min,
                humidity_avg: d.values.humidity_avg,
                wind_speed_avg: d.values.wind_speed_avg,
                precipitation_sum: d.values.precipitation_sum,
            })
            .collect();

        Self { location: raw.location, hourly, daily }
    }
}
