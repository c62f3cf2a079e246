//! Calendar parsing and formatting shared by the booking, bed and schedule endpoints.

use time::{format_description::FormatItem, macros::format_description, Date, PrimitiveDateTime, Time};

use crate::error::AppError;

const DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_HM: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const TIME_HMS: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const TIME_12H: &[FormatItem<'static>] =
    format_description!("[hour padding:none repr:12]:[minute] [period case_sensitive:false]");

/// `YYYY-MM-DD`; a time part after `T` or whitespace
/// (`2024-01-10T00:00:00Z`, `2024-01-10 10:00`) is ignored.
pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let raw = raw.trim();
    let invalid = || AppError::bad_request(format!("invalid date `{raw}`, expected YYYY-MM-DD"));
    let (day, rest) = match raw.get(..10) {
        Some(day) => (day, &raw[10..]),
        None => (raw, ""),
    };
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(char::is_whitespace)) {
        return Err(invalid());
    }
    Date::parse(day, DATE).map_err(|_| invalid())
}

/// `HH:MM`, `HH:MM:SS` or `h:MM AM`.
pub fn parse_time(raw: &str) -> Result<Time, AppError> {
    let raw = raw.trim();
    Time::parse(raw, TIME_HM)
        .or_else(|_| Time::parse(raw, TIME_HMS))
        .or_else(|_| Time::parse(raw, TIME_12H))
        .map_err(|_| AppError::bad_request(format!("invalid time `{raw}`, expected HH:MM")))
}

pub fn parse_slot(date: &str, time: &str) -> Result<PrimitiveDateTime, AppError> {
    Ok(PrimitiveDateTime::new(parse_date(date)?, parse_time(time)?))
}

/// A day with an optional time of day: `2024-01-10`, `2024-01-10 10:00`
/// or `2024-01-10T10:00:00.000Z`.
pub fn parse_day_and_time(raw: &str) -> Result<(Date, Option<Time>), AppError> {
    let raw = raw.trim();
    let day = parse_date(raw)?;
    let rest = raw.get(10..).unwrap_or("").trim_start_matches(['T', ' ']);
    if rest.is_empty() {
        return Ok((day, None));
    }
    let hm = rest.get(..5).unwrap_or(rest);
    Ok((day, Some(parse_time(hm)?)))
}

pub fn format_date(d: Date) -> String {
    d.format(DATE).unwrap_or_default()
}

pub fn format_time(t: Time) -> String {
    t.format(TIME_HM).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn slot_from_web_form() {
        assert_eq!(parse_slot("2024-01-10", "10:00").unwrap(), datetime!(2024-01-10 10:00));
        assert_eq!(parse_slot("2024-01-10", "10:30:00").unwrap(), datetime!(2024-01-10 10:30));
        assert_eq!(parse_slot("2024-01-10", "2:30 PM").unwrap(), datetime!(2024-01-10 14:30));
    }

    #[test]
    fn iso_timestamps_are_truncated_to_the_day() {
        assert_eq!(parse_date("2024-03-05T18:30:00.000Z").unwrap(), date!(2024-03-05));
    }

    #[test]
    fn malformed_input_is_a_bad_request() {
        assert!(matches!(parse_date("05/03/2024"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_date("2024-01-10garbage"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_date("2024-01-10-05"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_time("25:00"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_slot("2024-02-30", "10:00"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn day_with_optional_time() {
        assert_eq!(parse_day_and_time("2024-01-10").unwrap(), (date!(2024-01-10), None));
        assert_eq!(
            parse_day_and_time("2024-01-10 16:45").unwrap(),
            (date!(2024-01-10), Some(time!(16:45)))
        );
        assert_eq!(
            parse_day_and_time("2024-01-10T08:15:00.000Z").unwrap(),
            (date!(2024-01-10), Some(time!(8:15)))
        );
    }

    #[test]
    fn formatting_matches_parsing() {
        assert_eq!(format_date(date!(2024-01-10)), "2024-01-10");
        assert_eq!(format_time(time!(9:05)), "09:05");
    }
}
