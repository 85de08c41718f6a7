use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Label format used for months throughout the dashboard, e.g. `3/22`.
pub const MONTH_LABEL_FORMAT: &str = "%-m/%y";

/// Handles parsing timestamps from the formats the activity and version-history APIs emit
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a timestamp string into a DateTime<Utc>
    /// Handles Z suffix, explicit offsets, naive datetimes and bare dates
    pub fn parse(timestamp_str: &str) -> Result<DateTime<Utc>> {
        let trimmed = timestamp_str.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        // Naive datetime, assume UTC
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }

        // Bare date such as "2022-03-15"
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }

        anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
    }

    /// Parse a timestamp and render it as a month label (`M/yy`).
    ///
    /// The label comes from the date as written: an explicit offset is not converted to
    /// UTC first, so `2022-03-31T23:00:00-05:00` is `3/22`.
    pub fn month_label(timestamp_str: &str) -> Result<String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp_str.trim()) {
            return Ok(dt.format(MONTH_LABEL_FORMAT).to_string());
        }
        Self::parse(timestamp_str).map(|dt| Self::format_month(&dt))
    }

    pub fn format_month(dt: &DateTime<Utc>) -> String {
        dt.format(MONTH_LABEL_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_z_suffix() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000Z");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_timezone() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000+00:00");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_naive() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_bare_date() {
        let dt = TimestampParser::parse("2022-03-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2022-03-15T00:00:00+00:00");
    }

    #[test]
    fn test_parse_invalid() {
        let result = TimestampParser::parse("invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_month_label_has_no_padding() {
        assert_eq!(TimestampParser::month_label("2022-03-01T00:00:00Z").unwrap(), "3/22");
        assert_eq!(TimestampParser::month_label("2021-10-01T00:00:00Z").unwrap(), "10/21");
    }

    #[test]
    fn test_month_label_keeps_written_date() {
        assert_eq!(
            TimestampParser::month_label("2022-03-31T23:00:00-05:00").unwrap(),
            "3/22"
        );
        assert_eq!(
            TimestampParser::month_label("2022-04-01T01:00:00+02:00").unwrap(),
            "4/22"
        );
        assert_eq!(TimestampParser::month_label("2022-03-15").unwrap(), "3/22");
    }
}
