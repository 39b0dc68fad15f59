use chrono::{Datelike, NaiveDate, Weekday};
use volley_poll_bot::error::AppError;
use volley_poll_bot::utils::datetime::{
    format_date_with_weekday, next_occurrence, parse_training_time, weekday_from_name,
    weekday_name,
};

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[test]
fn test_same_weekday_projects_exactly_one_week_ahead() {
    // Walk two full weeks of reference dates; whenever the target
    // weekday equals the reference's own, the result must be +7 days.
    let base = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
    for offset in 0..14 {
        let reference = base + chrono::Duration::days(offset);
        let next = next_occurrence(reference.weekday(), reference);
        assert_eq!(
            next,
            reference + chrono::Duration::days(7),
            "same-day projection must land a week later for {reference}"
        );
    }
}

#[test]
fn test_other_weekdays_project_strictly_within_the_week() {
    let base = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
    for offset in 0..7 {
        let reference = base + chrono::Duration::days(offset);
        for target in ALL_WEEKDAYS {
            if target == reference.weekday() {
                continue;
            }
            let next = next_occurrence(target, reference);
            let days_ahead = (next - reference).num_days();
            assert!(
                (1..=6).contains(&days_ahead),
                "projection from {reference} to {target:?} was {days_ahead} days"
            );
            assert_eq!(next.weekday(), target);
        }
    }
}

#[test]
fn test_invalid_weekday_is_a_validation_error() {
    for token in ["invalid", "", "someday", "wed nesday", "7"] {
        match weekday_from_name(token) {
            Err(AppError::InvalidWeekday(raw)) => assert_eq!(raw, token),
            other => panic!("expected InvalidWeekday for '{token}', got {other:?}"),
        }
    }
}

#[test]
fn test_case_variants_parse_identically() {
    for weekday in ALL_WEEKDAYS {
        let canonical = weekday_name(weekday);
        let upper = canonical.to_uppercase();
        let mut title = canonical.to_string();
        title.replace_range(0..1, &canonical[0..1].to_uppercase());

        assert_eq!(weekday_from_name(canonical).unwrap(), weekday);
        assert_eq!(weekday_from_name(&upper).unwrap(), weekday);
        assert_eq!(weekday_from_name(&title).unwrap(), weekday);
    }
}

#[test]
fn test_time_parsing_errors_are_invalid_time_format() {
    for token in ["", "18", "18:", ":30", "half past six", "12:34:56"] {
        match parse_training_time(token) {
            Err(AppError::InvalidTimeFormat(raw)) => assert_eq!(raw, token),
            other => panic!("expected InvalidTimeFormat for '{token}', got {other:?}"),
        }
    }

    assert_eq!(parse_training_time("06:30").unwrap(), (6, 30));
    assert_eq!(parse_training_time("23:59").unwrap(), (23, 59));
}

#[test]
fn test_dated_string_carries_the_display_weekday() {
    // 2026-02-20 is a Friday
    let date = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
    assert_eq!(format_date_with_weekday(date), "20.02.2026 (пятница)");
}
