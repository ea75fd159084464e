//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The API access layer: per-category key fallback chains, key health,
//!   request throttling, usage counters and error classification
//! - The Tomorrow.io transport
//! - `WeatherClient` and the normalized weather shapes it returns
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod category;
pub mod client;
pub mod codes;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod keys;
pub mod model;
pub mod provider;
pub mod throttle;
pub mod usage;

pub use category::{PerCategory, RequestCategory};
pub use client::{DEFAULT_HISTORY_DAYS, WeatherClient};
pub use codes::{weather_code, weather_status};
pub use config::{Config, FallbackOrders, Units};
pub use dispatcher::{DispatchContext, RequestDispatcher};
pub use error::{ClassifiedError, ErrorKind, TransportError, classify};
pub use health::{KeyHealthRecord, KeyHealthTracker, Validity};
pub use keys::{Credential, FallbackChain, KeyRegistry};
pub use model::{
    CurrentWeather, DailyForecast, DailyHistory, ForecastBundle, HistoryBundle, HourlyForecast,
    HourlyHistory, Location,
};
pub use provider::{TomorrowTransport, Transport};
pub use throttle::{MIN_INTERVAL, RequestThrottle};
pub use usage::{UsageCounter, UsageSnapshot};
