/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Formatting and parsing for the two SigV4 date formats: the full
//! `YYYYMMDD'T'HHMMSS'Z'` timestamp and the bare `YYYYMMDD` date used in credential scopes.

use std::fmt;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// `YYYYMMDD'T'HHMMSS'Z'`, e.g. `20150830T123600Z`.
pub fn format_date_time(dt: OffsetDateTime) -> String {
    let dt = dt.to_offset(time::UtcOffset::UTC);
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        dt.year(),
        dt.month() as u8,
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

/// `YYYYMMDD`, e.g. `20150830`.
pub fn format_date(dt: OffsetDateTime) -> String {
    let dt = dt.to_offset(time::UtcOffset::UTC);
    format!("{:04}{:02}{:02}", dt.year(), dt.month() as u8, dt.day())
}

/// Parses a `YYYYMMDD'T'HHMMSS'Z'` timestamp.
pub fn parse_date_time(s: &str) -> Result<OffsetDateTime, DateTimeParseError> {
    if s.len() != 16 || s.as_bytes()[8] != b'T' || s.as_bytes()[15] != b'Z' {
        return Err(DateTimeParseError::new(s));
    }
    let date = parse_date_only(&s[0..8]).ok_or_else(|| DateTimeParseError::new(s))?;
    let hour: u8 = s[9..11].parse().map_err(|_| DateTimeParseError::new(s))?;
    let minute: u8 = s[11..13].parse().map_err(|_| DateTimeParseError::new(s))?;
    let second: u8 = s[13..15].parse().map_err(|_| DateTimeParseError::new(s))?;
    let time = Time::from_hms(hour, minute, second).map_err(|_| DateTimeParseError::new(s))?;
    Ok(PrimitiveDateTime::new(date, time).assume_utc())
}

/// Parses a bare `YYYYMMDD` date.
pub fn parse_date(s: &str) -> Result<Date, DateTimeParseError> {
    parse_date_only(s).ok_or_else(|| DateTimeParseError::new(s))
}

fn parse_date_only(s: &str) -> Option<Date> {
    if s.len() != 8 {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u8 = s[4..6].parse().ok()?;
    let day: u8 = s[6..8].parse().ok()?;
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Error returned when a timestamp does not match the expected SigV4 format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    input: String,
}

impl DateTimeParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

impl fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid SigV4 date/time: {:?}", self.input)
    }
}

impl std::error::Error for DateTimeParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_the_known_answer_timestamp() {
        let dt = parse_date_time("20150830T123600Z").unwrap();
        assert_eq!(format_date_time(dt), "20150830T123600Z");
        assert_eq!(format_date(dt), "20150830");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_date_time("2015-08-30T12:36:00Z").is_err());
        assert!(parse_date_time("20150830T123600").is_err());
    }
}
