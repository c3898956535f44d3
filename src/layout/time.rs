//! "HH:MM" parsing for the day-column layout

use std::fmt;

use thiserror::Error;

/// Minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Minutes(pub i32);

impl Minutes {
    pub fn from_hour(hour: u8) -> Self {
        Self(hour as i32 * 60)
    }

    pub fn as_f32(self) -> f32 {
        self.0 as f32
    }

    /// Fractional hours, e.g. 90 minutes -> 1.5
    pub fn hours(self) -> f32 {
        self.0 as f32 / 60.0
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.div_euclid(60), self.0.rem_euclid(60))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("time {0:?} has no minutes field")]
    MissingMinutes(String),
    #[error("time {input:?} has a non-numeric field {field:?}")]
    InvalidField { input: String, field: String },
    #[error("time {0:?} is too large to count in minutes")]
    OutOfRange(String),
}

/// Parse "HH:MM" to minutes since midnight.
///
/// Fields are coerced loosely: surrounding whitespace is ignored, an empty
/// field counts as zero and anything after the second colon is dropped, so
/// "9:0" and "09:00:30" both give 540. Hours are not range checked, but a
/// total that overflows `i32` is [`TimeParseError::OutOfRange`].
pub fn parse_time_to_minutes(time: &str) -> Result<Minutes, TimeParseError> {
    let mut fields = time.split(':');
    // split always yields at least one item
    let hours = fields.next().unwrap_or_default();
    let minutes = fields
        .next()
        .ok_or_else(|| TimeParseError::MissingMinutes(time.to_string()))?;

    let h = coerce_field(time, hours)?;
    let m = coerce_field(time, minutes)?;
    h.checked_mul(60)
        .and_then(|total| total.checked_add(m))
        .map(Minutes)
        .ok_or_else(|| TimeParseError::OutOfRange(time.to_string()))
}

fn coerce_field(input: &str, field: &str) -> Result<i32, TimeParseError> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<i32>().map_err(|_| TimeParseError::InvalidField {
        input: input.to_string(),
        field: field.to_string(),
    })
}

/// A parsed activity time range, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: Minutes,
    pub end: Minutes,
}

impl TimeSpan {
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeParseError> {
        Ok(Self {
            start: parse_time_to_minutes(start)?,
            end: parse_time_to_minutes(end)?,
        })
    }

    /// Half-open intersection: touching endpoints do not overlap
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration(&self) -> Minutes {
        Minutes(self.end.0.saturating_sub(self.start.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_times() {
        assert_eq!(parse_time_to_minutes("00:00"), Ok(Minutes(0)));
        assert_eq!(parse_time_to_minutes("09:30"), Ok(Minutes(570)));
        assert_eq!(parse_time_to_minutes("23:59"), Ok(Minutes(1439)));
    }

    #[test]
    fn coerces_loose_fields() {
        assert_eq!(parse_time_to_minutes("9:0"), Ok(Minutes(540)));
        assert_eq!(parse_time_to_minutes(" 9 : 05 "), Ok(Minutes(545)));
        assert_eq!(parse_time_to_minutes("9:"), Ok(Minutes(540)));
        assert_eq!(parse_time_to_minutes("09:00:30"), Ok(Minutes(540)));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(matches!(
            parse_time_to_minutes("0900"),
            Err(TimeParseError::MissingMinutes(_))
        ));
        assert!(matches!(
            parse_time_to_minutes("ab:30"),
            Err(TimeParseError::InvalidField { .. })
        ));
        assert!(matches!(
            parse_time_to_minutes("10:3x"),
            Err(TimeParseError::InvalidField { .. })
        ));
    }

    #[test]
    fn hours_are_not_range_checked() {
        assert_eq!(parse_time_to_minutes("25:00"), Ok(Minutes(1500)));
    }

    #[test]
    fn oversized_fields_are_an_error() {
        assert!(matches!(
            parse_time_to_minutes("35791395:00"),
            Err(TimeParseError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_time_to_minutes("35791394:2147483647"),
            Err(TimeParseError::OutOfRange(_))
        ));
        // Largest hour that still fits
        assert_eq!(parse_time_to_minutes("35791394:00"), Ok(Minutes(35791394 * 60)));
    }

    #[test]
    fn display_pads_hours_and_minutes() {
        assert_eq!(Minutes(545).to_string(), "09:05");
        assert_eq!(Minutes::from_hour(20).to_string(), "20:00");
    }

    #[test]
    fn touching_spans_do_not_overlap() {
        let a = TimeSpan::parse("09:00", "10:00").unwrap();
        let b = TimeSpan::parse("10:00", "11:00").unwrap();
        let c = TimeSpan::parse("09:59", "10:30").unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }
}
