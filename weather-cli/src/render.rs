//! Human-friendly output formatting.

use chrono::{DateTime, Local, Utc};
use std::fmt::Write;
use weather_core::{
    ClassifiedError, CurrentWeather, ForecastBundle, HistoryBundle, KeyHealthRecord, Location,
    Units, UsageSnapshot, Validity, weather_status,
};

struct Symbols {
    temperature: &'static str,
    speed: &'static str,
    precipitation: &'static str,
}

fn symbols(units: Option<Units>) -> Symbols {
    match units {
        Some(Units::Imperial) => Symbols { temperature: "°F", speed: "mph", precipitation: "in" },
        _ => Symbols { temperature: "°C", speed: "m/s", precipitation: "mm" },
    }
}

fn value(v: Option<f64>, unit: &str) -> String {
    match v {
        Some(v) => format!("{v:.1}{unit}"),
        None => "-".to_string(),
    }
}

fn condition(code: Option<u32>) -> &'static str {
    code.map(weather_status).unwrap_or("-")
}

fn location_name(location: &Location, fallback: &str) -> String {
    match (&location.name, location.lat, location.lon) {
        (Some(name), _, _) => name.clone(),
        (None, Some(lat), Some(lon)) => format!("{lat:.4}, {lon:.4}"),
        _ => fallback.to_string(),
    }
}

/// Local wall-clock rendering of an API timestamp; unparseable input is kept.
pub fn local_time(iso: &str, pattern: &str) -> String {
    DateTime::parse_from_rfc3339(iso)
        .map(|t| t.with_timezone(&Local).format(pattern).to_string())
        .unwrap_or_else(|_| iso.to_string())
}

pub fn current(city: &str, weather: &CurrentWeather, units: Option<Units>) -> String {
    let s = symbols(units);
    let mut out = String::new();

    let _ = writeln!(out, "Current weather for {}", location_name(&weather.location, city));
    let _ = writeln!(out, "  Observed:    {}", local_time(&weather.data.time, "%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "  Condition:   {}", condition(weather.weather_code()));
    let _ = writeln!(out, "  Temperature: {}", value(weather.temperature(), s.temperature));
    let _ = writeln!(out, "  Feels like:  {}", value(weather.value("temperatureApparent"), s.temperature));
    let _ = writeln!(out, "  Humidity:    {}", value(weather.value("humidity"), "%"));
    let _ = writeln!(out, "  Wind:        {}", value(weather.value("windSpeed"), &format!(" {}", s.speed)));
    let _ = write!(
        out,
        "  Rain:        {}",
        value(weather.value("precipitationIntensity"), &format!(" {}/h", s.precipitation))
    );

    out
}

pub fn forecast(city: &str, bundle: &ForecastBundle, hours: usize, days: usize, units: Option<Units>) -> String {
    let s = symbols(units);
    let mut out = String::new();

    let _ = writeln!(out, "Forecast for {}", location_name(&bundle.location, city));

    let _ = writeln!(out, "\nHourly");
    for hour in bundle.hourly.iter().take(hours) {
        let _ = writeln!(
            out,
            "  {:<16} {:>8}  {}",
            local_time(&hour.time, "%a %H:%M"),
            value(hour.temperature, s.temperature),
            condition(hour.weather_code),
        );
    }

    let _ = writeln!(out, "\nDaily");
    for day in bundle.daily.iter().take(days) {
        let _ = writeln!(
            out,
            "  {:<16} {:>8} / {:<8}  {}",
            local_time(&day.time, "%a %d %b"),
            value(day.temperature_max, s.temperature),
            value(day.temperature_min, s.temperature),
            condition(day.weather_code),
        );
    }

    out.trim_end().to_string()
}

pub fn history(city: &str, bundle: &HistoryBundle, units: Option<Units>) -> String {
    let s = symbols(units);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Recent history for {} ({} hourly readings)",
        location_name(&bundle.location, city),
        bundle.hourly.len()
    );
    let _ = writeln!(
        out,
        "  {:<12} {:>8} {:>8} {:>8} {:>6} {:>10} {:>8}",
        "Day", "Avg", "Max", "Min", "Hum", "Wind", "Precip"
    );

    for day in &bundle.daily {
        let _ = writeln!(
            out,
            "  {:<12} {:>8} {:>8} {:>8} {:>6} {:>10} {:>8}",
            local_time(&day.time, "%a %d %b"),
            value(day.temperature_avg, s.temperature),
            value(day.temperature_max, s.temperature),
            value(day.temperature_min, s.temperature),
            value(day.humidity_avg, "%"),
            value(day.wind_speed_avg, &format!(" {}", s.speed)),
            value(day.precipitation_sum, s.precipitation),
        );
    }

    out.trim_end().to_string()
}

/// "3 minutes ago" style rendering of the time between `from` and `now`.
pub fn time_since(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - from).num_seconds().max(0);
    let (n, unit) = if secs >= 3600 {
        (secs / 3600, "hour")
    } else if secs >= 60 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    format!("{n} {unit}{} ago", if n == 1 { "" } else { "s" })
}

pub fn usage(snapshot: &UsageSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "API usage");
    let _ = writeln!(out, "  Current:    {}", snapshot.current);
    let _ = writeln!(out, "  Forecast:   {}", snapshot.forecast);
    let _ = writeln!(out, "  Historical: {}", snapshot.historical);
    let _ = writeln!(out, "  Total:      {}", snapshot.total);
    let _ = write!(
        out,
        "  Since:      {} ({})",
        snapshot.last_reset_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        time_since(snapshot.last_reset_at, snapshot.last_checked)
    );

    out
}

pub fn key_health(records: &[KeyHealthRecord]) -> String {
    let mut out = String::from("Key health");

    for record in records {
        let validity = match record.is_valid {
            Validity::Unknown => "unknown",
            Validity::Valid => "valid",
            Validity::Invalid => "invalid",
        };
        let _ = write!(
            out,
            "\n  {:<11} {:<8} failures: {}",
            record.category.as_str(),
            validity,
            record.consecutive_failures
        );
        if let Some(message) = &record.last_error_message {
            let _ = write!(out, " ({message})");
        }
    }

    out
}

pub fn error_panel(error: &ClassifiedError) -> String {
    let kind = error.kind();
    format!(
        "{} {}\n   {}\n   {}",
        kind.icon(),
        kind.title(),
        error.message(),
        kind.suggested_action()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use weather_core::{ErrorKind, HourlyForecast, RequestCategory};

    #[test]
    fn time_since_picks_largest_unit() {
        let now = Utc::now();
        assert_eq!(time_since(now - Duration::seconds(1), now), "1 second ago");
        assert_eq!(time_since(now - Duration::seconds(45), now), "45 seconds ago");
        assert_eq!(time_since(now - Duration::minutes(3), now), "3 minutes ago");
        assert_eq!(time_since(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(time_since(now + Duration::seconds(5), now), "0 seconds ago");
    }

    #[test]
    fn error_panel_shows_kind_specific_action() {
        let err = ClassifiedError::new(ErrorKind::NetworkError, "Unable to reach the weather service");
        let panel = error_panel(&err);

        assert!(panel.contains("Network Error"));
        assert!(panel.contains("Unable to reach the weather service"));
        assert!(panel.contains("check your internet connection"));
    }

    #[test]
    fn forecast_limits_rows_and_marks_missing_values() {
        let bundle = ForecastBundle {
            location: Location::default(),
            hourly: (0..5)
                .map(|h| HourlyForecast {
                    time: format!("not-a-time-{h}"),
                    temperature: if h == 0 { None } else { Some(h as f64) },
                    weather_code: Some(1000),
                })
                .collect(),
            daily: Vec::new(),
        };

        let text = forecast("Lyon", &bundle, 2, 7, None);
        assert!(text.starts_with("Forecast for Lyon"));
        assert!(text.contains("not-a-time-1"));
        assert!(!text.contains("not-a-time-2"));
        assert!(text.contains("Clear"));
        assert!(text.contains(" - "));
    }

    #[test]
    fn key_health_lists_every_category() {
        let records: Vec<_> = RequestCategory::all().iter().map(|c| KeyHealthRecord::new(*c)).collect();
        let text = key_health(&records);
        assert!(text.contains("current"));
        assert!(text.contains("historical"));
        assert!(text.contains("unknown"));
    }
}
