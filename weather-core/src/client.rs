use anyhow::Context;
use chrono::{Days, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    category::RequestCategory,
    config::{Config, Units},
    dispatcher::RequestDispatcher,
    error::{ClassifiedError, ErrorKind},
    health::KeyHealthRecord,
    model::{CurrentWeather, ForecastBundle, HistoryBundle, TmTimelinesResponse},
    provider::TomorrowTransport,
    usage::UsageSnapshot,
};

pub const DEFAULT_HISTORY_DAYS: u32 = 7;

pub mod endpoints {
    pub const REALTIME: &str = "weather/realtime";
    pub const FORECAST: &str = "weather/forecast";
    pub const HISTORY_RECENT: &str = "weather/history/recent";
}

/// Current, forecast and historical weather for a city.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    dispatcher: RequestDispatcher,
    units: Option<Units>,
}

impl WeatherClient {
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher, units: None }
    }

    pub fn with_units(mut self, units: Option<Units>) -> Self {
        self.units = units;
        self
    }

    /// Client talking to the configured Tomorrow.io endpoint.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = config.key_registry()?;
        let transport = TomorrowTransport::new(config.base_url(), config.timeout())
            .context("Failed to build HTTP client")?;

        let dispatcher = RequestDispatcher::new(Arc::new(transport), registry);
        Ok(Self::new(dispatcher).with_units(config.units))
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.dispatcher.context().usage.snapshot()
    }

    pub fn key_health(&self) -> Vec<KeyHealthRecord> {
        self.dispatcher.context().health.records()
    }

    pub async fn current_weather(&self, city: &str) -> Result<CurrentWeather, ClassifiedError> {
        let category = RequestCategory::Current;
        let payload =
            self.dispatcher.dispatch(category, endpoints::REALTIME, &self.params(city)).await?;
        decode(payload, category)
    }

    pub async fn forecast(&self, city: &str) -> Result<ForecastBundle, ClassifiedError> {
        let category = RequestCategory::Forecast;
        let payload =
            self.dispatcher.dispatch(category, endpoints::FORECAST, &self.params(city)).await?;
        let raw: TmTimelinesResponse = decode(payload, category)?;
        Ok(raw.into())
    }

    /// Recent history covering the last `days` days up to today (UTC).
    pub async fn historical_weather(&self, city: &str, days: u32) -> Result<HistoryBundle, ClassifiedError> {
        let category = RequestCategory::Historical;
        let (start, end) = history_window(Utc::now().date_naive(), days);

        let mut params = self.params(city);
        params.push(("startTime", start));
        params.push(("endTime", end));

        let payload = self.dispatcher.dispatch(category, endpoints::HISTORY_RECENT, &params).await?;
        let raw: TmTimelinesResponse = decode(payload, category)?;
        Ok(raw.into())
    }

    fn params(&self, city: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("location", city.to_string())];
        if let Some(units) = self.units {
            params.push(("units", units.as_str().to_string()));
        }
        params
    }
}

/// `YYYY-MM-DD` start and end dates for a look-back of `days` ending `today`.
pub fn history_window(today: NaiveDate, days: u32) -> (String, String) {
    let start = today.checked_sub_days(Days::new(days.into())).unwrap_or(NaiveDate::MIN);
    (start.format("%Y-%m-%d").to_string(), today.format("%Y-%m-%d").to_string())
}

fn decode<T: DeserializeOwned>(payload: Value, category: RequestCategory) -> Result<T, ClassifiedError> {
    serde_json::from_value(payload).map_err(|e| {
        ClassifiedError::new(
            ErrorKind::UnknownError,
            format!("Unexpected {category} response from the weather service: {e}"),
        )
    })
}
