//! Date and clock helpers shared by the dialogs and the schedule views

use chrono::{Datelike, Duration, NaiveDate};

use crate::config::ClockFormat;

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday();
    date - Duration::days(days_from_monday as i64)
}

/// Parse a user-entered time ("9:00am", "14:30", "2pm") to "HH:MM"
pub fn parse_start_time(input: &str) -> Option<String> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let (time_part, meridiem) = if let Some(rest) = input.strip_suffix("pm") {
        (rest, Some(true))
    } else if let Some(rest) = input.strip_suffix("am") {
        (rest, Some(false))
    } else if let Some(rest) = input.strip_suffix('p') {
        (rest, Some(true))
    } else if let Some(rest) = input.strip_suffix('a') {
        (rest, Some(false))
    } else {
        (input.as_str(), None) // 24-hour format assumed
    };

    let time_part = time_part.trim();
    let (hour, minute) = match time_part.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (time_part.parse::<u32>().ok()?, 0),
    };

    let hour_24 = match meridiem {
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(true) if hour < 12 => hour + 12,
        Some(false) if hour == 12 => 0, // 12am = midnight
        _ => hour,
    };

    if hour_24 > 23 || minute > 59 {
        return None;
    }

    Some(format!("{:02}:{:02}", hour_24, minute))
}

/// Format a time string "HH:MM" according to clock format
pub fn format_clock_time(time_24: &str, clock_format: ClockFormat) -> String {
    match clock_format {
        ClockFormat::Hour24 => time_24.to_string(),
        ClockFormat::Hour12 => {
            let Some((h, m)) = time_24.split_once(':') else {
                return time_24.to_string();
            };
            let (Ok(hour), Ok(min)) = (h.trim().parse::<u32>(), m.trim().parse::<u32>()) else {
                return time_24.to_string();
            };
            let (h12, ampm) = match hour {
                0 => (12, "am"),
                1..=11 => (hour, "am"),
                12 => (12, "pm"),
                _ => (hour - 12, "pm"),
            };
            format!("{}:{:02}{}", h12, min, ampm)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_starts_on_monday() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn parses_user_times() {
        assert_eq!(parse_start_time("14:30").as_deref(), Some("14:30"));
        assert_eq!(parse_start_time("9").as_deref(), Some("09:00"));
        assert_eq!(parse_start_time("2pm").as_deref(), Some("14:00"));
        assert_eq!(parse_start_time("9:15 am").as_deref(), Some("09:15"));
        assert_eq!(parse_start_time("12am").as_deref(), Some("00:00"));
        assert_eq!(parse_start_time("12p").as_deref(), Some("12:00"));
    }

    #[test]
    fn rejects_impossible_times() {
        assert_eq!(parse_start_time(""), None);
        assert_eq!(parse_start_time("24:00"), None);
        assert_eq!(parse_start_time("10:75"), None);
        assert_eq!(parse_start_time("13pm"), None);
        assert_eq!(parse_start_time("noon"), None);
    }

    #[test]
    fn formats_twelve_hour_clock() {
        assert_eq!(format_clock_time("00:05", ClockFormat::Hour12), "12:05am");
        assert_eq!(format_clock_time("12:00", ClockFormat::Hour12), "12:00pm");
        assert_eq!(format_clock_time("17:30", ClockFormat::Hour12), "5:30pm");
        assert_eq!(format_clock_time("17:30", ClockFormat::Hour24), "17:30");
        assert_eq!(format_clock_time("bad", ClockFormat::Hour12), "bad");
    }
}
