use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::AppError;

/// Parses a weekday token against the seven canonical English names,
/// case-insensitively. Anything else is rejected.
pub fn weekday_from_name(name: &str) -> Result<Weekday, AppError> {
    match name.trim().to_lowercase().as_str() {
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        "sunday" => Ok(Weekday::Sun),
        _ => Err(AppError::InvalidWeekday(name.to_string())),
    }
}

/// Canonical lowercase name for a weekday, the form stored in schedules.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Splits an `HH:MM` string into hour and minute integers.
pub fn parse_training_time(time: &str) -> Result<(u32, u32), AppError> {
    let invalid = || AppError::InvalidTimeFormat(time.to_string());

    let (hour_str, minute_str) = time.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;

    if hour > 23 || minute > 59 {
        return Err(invalid());
    }

    Ok((hour, minute))
}

/// Date of the next occurrence of `target` strictly after `reference`.
///
/// If the reference date already falls on the target weekday the result
/// is a full week later, never the same day. A poll posted on the
/// training weekday therefore always announces next week's training.
pub fn next_occurrence(target: Weekday, reference: NaiveDate) -> NaiveDate {
    let mut days_ahead = i64::from(target.num_days_from_monday())
        - i64::from(reference.weekday().num_days_from_monday());
    if days_ahead <= 0 {
        days_ahead += 7;
    }
    reference + chrono::Duration::days(days_ahead)
}

/// Russian weekday name for user-facing messages.
pub fn weekday_russian(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "понедельник",
        Weekday::Tue => "вторник",
        Weekday::Wed => "среда",
        Weekday::Thu => "четверг",
        Weekday::Fri => "пятница",
        Weekday::Sat => "суббота",
        Weekday::Sun => "воскресенье",
    }
}

/// Formats a date as `DD.MM.YYYY (<weekday>)` for poll messages,
/// e.g. `15.02.2026 (воскресенье)`.
pub fn format_date_with_weekday(date: NaiveDate) -> String {
    format!("{} ({})", date.format("%d.%m.%Y"), weekday_russian(date.weekday()))
}
