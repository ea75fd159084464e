/// Tomorrow.io weather codes and their display text.
const WEATHER_CODES: &[(u32, &str)] = &[
    (1000, "Clear"),
    (1001, "Cloudy"),
    (1100, "Mostly Clear"),
    (1101, "Partly Cloudy"),
    (1102, "Mostly Cloudy"),
    (2000, "Fog"),
    (2100, "Light Fog"),
    (4000, "Drizzle"),
    (4001, "Drizzle Rain"),
    (4200, "Light Rain"),
    (4201, "Heavy Rain"),
    (5000, "Snow"),
    (5001, "Light Thunder"),
    (8000, "Mostly Sunny"),
];

const CLEAR: u32 = 1000;

/// Text for a weather code, `"Unknown"` when the code is not mapped.
pub fn weather_status(code: u32) -> &'static str {
    WEATHER_CODES.iter().find(|(c, _)| *c == code).map(|(_, s)| *s).unwrap_or("Unknown")
}

/// Code for a status text. Unrecognized text maps to Clear.
///
/// For callers holding display text only, e.g. a saved report, that need the icon code back.
pub fn weather_code(status: &str) -> u32 {
    WEATHER_CODES
        .iter()
        .find(|(_, s)| s.eq_ignore_ascii_case(status.trim()))
        .map(|(c, _)| *c)
        .unwrap_or(CLEAR)
}
