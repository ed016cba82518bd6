//! Schedule time handling.
//!
//! Times on a day plan are minutes since midnight of the travel day. The
//! timeline is contiguous: a stop that ends after midnight is shown as
//! `25:10`, not wrapped back to `01:10`.
//!
//! Every [`TimeValue`] carries its numeric value and its display text
//! together. The only way to build one is through the constructors below,
//! so the two can never drift apart.

use std::fmt;

use chrono::Duration;
use serde::Serialize;

/// Error returned when parsing invalid time or duration text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// How a [`TimeValue`] is rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// A point on the day timeline, `HH:MM`.
    Clock,
    /// A length of time, `1h 30m`.
    Span,
}

/// A time value in minutes together with its display text.
///
/// # Examples
///
/// ```
/// use day_planner::domain::{TimeValue, add_times};
///
/// let start = TimeValue::parse_clock("09:00").unwrap();
/// let stay = TimeValue::span(90);
/// let end = add_times(&start, &stay);
/// assert_eq!(end.text(), "10:30");
/// assert_eq!(end.value(), 630);
/// ```
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TimeValue {
    value: u32,
    format: TimeFormat,
    text: String,
}

impl TimeValue {
    /// A point on the day timeline.
    pub fn clock(minutes: u32) -> Self {
        Self::with_format(minutes, TimeFormat::Clock)
    }

    /// A length of time.
    pub fn span(minutes: u32) -> Self {
        Self::with_format(minutes, TimeFormat::Span)
    }

    fn with_format(value: u32, format: TimeFormat) -> Self {
        Self {
            value,
            format,
            text: time_value_to_text(value, format),
        }
    }

    /// Parse an `HH:MM` wall-clock string into a clock value.
    pub fn parse_clock(text: &str) -> Result<Self, TimeError> {
        Ok(Self::clock(time_text_to_value(text)?))
    }

    /// A span from a travel estimate, rounded to whole minutes.
    pub fn from_travel(travel: Duration) -> Self {
        Self::span(minutes_rounded(travel))
    }

    /// Minutes since midnight (clock) or length in minutes (span).
    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn format(&self) -> TimeFormat {
        self.format
    }

    /// Display text, always derived from [`value`](Self::value).
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeValue({} = {})", self.value, self.text)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Add two time values.
///
/// The result keeps the format of `a`: clock + span is a clock time,
/// span + span is a longer span.
pub fn add_times(a: &TimeValue, b: &TimeValue) -> TimeValue {
    TimeValue::with_format(a.value.saturating_add(b.value), a.format)
}

/// Parse strict `HH:MM` text into minutes since midnight.
///
/// # Examples
///
/// ```
/// use day_planner::domain::time_text_to_value;
///
/// assert_eq!(time_text_to_value("09:20").unwrap(), 560);
/// assert!(time_text_to_value("9:20").is_err());
/// assert!(time_text_to_value("24:00").is_err());
/// assert!(time_text_to_value("12:60").is_err());
/// ```
pub fn time_text_to_value(text: &str) -> Result<u32, TimeError> {
    if text.len() != 5 {
        return Err(TimeError::new("expected HH:MM format"));
    }

    let bytes = text.as_bytes();
    if bytes[2] != b':' {
        return Err(TimeError::new("expected colon at position 2"));
    }

    let hour =
        parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
    if hour > 23 {
        return Err(TimeError::new("hour must be 0-23"));
    }

    let minute =
        parse_two_digits(&bytes[3..5]).ok_or_else(|| TimeError::new("invalid minute digits"))?;
    if minute > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }

    Ok(hour * 60 + minute)
}

/// Format minutes as display text.
///
/// Hours keep counting past 23 in both formats.
pub fn time_value_to_text(value: u32, format: TimeFormat) -> String {
    let hours = value / 60;
    let minutes = value % 60;
    match format {
        TimeFormat::Clock => format!("{hours:02}:{minutes:02}"),
        TimeFormat::Span => format!("{hours}h {minutes:02}m"),
    }
}

/// Round a travel estimate to whole minutes, half up.
///
/// Negative durations clamp to zero.
pub fn minutes_rounded(travel: Duration) -> u32 {
    let secs = travel.num_seconds().max(0);
    u32::try_from((secs + 30) / 60).unwrap_or(u32::MAX)
}

/// How long a traveller stays at a stop, as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayDuration {
    hours: u32,
    minutes: u32,
}

impl StayDuration {
    pub fn new(hours: u32, minutes: u32) -> Result<Self, TimeError> {
        if minutes > 59 {
            return Err(TimeError::new("duration minutes must be 0-59"));
        }
        Ok(Self { hours, minutes })
    }

    /// Parse the hour and minute fields of a duration form.
    ///
    /// Surrounding whitespace is ignored; anything but unsigned digits is
    /// rejected.
    pub fn parse(hours: &str, minutes: &str) -> Result<Self, TimeError> {
        let hours = parse_field(hours).ok_or_else(|| TimeError::new("invalid duration hours"))?;
        let minutes =
            parse_field(minutes).ok_or_else(|| TimeError::new("invalid duration minutes"))?;
        Self::new(hours, minutes)
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }

    pub fn to_time_value(self) -> TimeValue {
        TimeValue::span(self.total_minutes())
    }
}

fn parse_field(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Formatting a wall-clock value and parsing it back is lossless
        #[test]
        fn clock_text_parses_back(value in 0u32..1440) {
            let text = time_value_to_text(value, TimeFormat::Clock);
            prop_assert_eq!(time_text_to_value(&text).unwrap(), value);
        }

        /// Text is always re-derived from the summed value
        #[test]
        fn add_text_matches_value(a in 0u32..3000, b in 0u32..3000) {
            let sum = add_times(&TimeValue::clock(a), &TimeValue::span(b));
            prop_assert_eq!(sum.value(), a + b);
            prop_assert_eq!(sum.text(), time_value_to_text(a + b, TimeFormat::Clock));
        }

        /// Clock hours keep counting instead of wrapping at 24
        #[test]
        fn clock_hours_monotonic(value in 0u32..10_000) {
            let text = time_value_to_text(value, TimeFormat::Clock);
            let hours: u32 = text.split(':').next().unwrap().parse().unwrap();
            prop_assert_eq!(hours, value / 60);
        }
    }
}
