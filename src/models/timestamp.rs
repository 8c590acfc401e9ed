//! Lenient timestamp parsing.
//!
//! The web client sends `YYYY-MM-DD HH:MM:SS`, API users tend to send
//! ISO-8601 with a `T` separator, and date filters are often bare dates.
//! All three are accepted; output is always chrono's ISO-8601 form.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim().trim_end_matches('Z');

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_client_and_iso_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        assert_eq!(parse("2024-05-01 18:30:00"), Some(expected));
        assert_eq!(parse("2024-05-01T18:30:00"), Some(expected));
        assert_eq!(parse("2024-05-01T18:30:00Z"), Some(expected));
    }

    #[test]
    fn bare_date_is_midnight() {
        let parsed = parse("2024-05-01").unwrap();
        assert_eq!(parsed.to_string(), "2024-05-01 00:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("next tuesday"), None);
        assert_eq!(parse("2024-13-01"), None);
    }
}
