//! Task number format and deadline parsing.

use chrono::{Datelike, NaiveDate, Timelike};
use taskdesk::services::task_service::{
    day_prefix, is_task_number, next_task_number, parse_deadline,
};

#[test]
fn day_prefix_embeds_the_date() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(day_prefix(date), "TASK-20250307");
}

#[test]
fn first_number_of_the_day_is_0001() {
    assert_eq!(
        next_task_number("TASK-20250307", None),
        "TASK-20250307-0001"
    );
}

#[test]
fn numbers_increment_within_a_day() {
    assert_eq!(
        next_task_number("TASK-20250307", Some("TASK-20250307-0042")),
        "TASK-20250307-0043"
    );
    assert_eq!(
        next_task_number("TASK-20250307", Some("TASK-20250307-9999")),
        "TASK-20250307-10000"
    );
}

#[test]
fn garbage_last_number_restarts_the_sequence() {
    assert_eq!(
        next_task_number("TASK-20250307", Some("TASK-20250307-garbage")),
        "TASK-20250307-0001"
    );
}

#[test]
fn format_recognizer_accepts_only_the_canonical_shape() {
    assert!(is_task_number("TASK-20250307-0001"));
    // Busy days roll past 9999 without padding; those numbers stay valid.
    assert!(is_task_number("TASK-20250307-10000"));
    assert!(!is_task_number("TASK-20250307-001"));
    assert!(!is_task_number("TASK-2025037-0001"));
    assert!(!is_task_number("task-20250307-0001"));
    assert!(!is_task_number("TASK-20250307-0001x"));
    assert!(!is_task_number(""));
}

#[test]
fn deadline_accepts_all_five_formats() {
    let cases = [
        "2025-03-07 14:30:00",
        "2025-03-07T14:30",
        "2025-03-07",
        "07.03.2025",
        "07/03/2025",
    ];

    for case in cases {
        let parsed = parse_deadline(case).unwrap_or_else(|| panic!("failed to parse {}", case));
        assert_eq!(parsed.year(), 2025);
        assert_eq!(parsed.month(), 3);
        assert_eq!(parsed.day(), 7);
    }
}

#[test]
fn datetime_formats_keep_the_time_of_day() {
    let parsed = parse_deadline("2025-03-07 14:30:00").unwrap();
    assert_eq!(parsed.hour(), 14);
    assert_eq!(parsed.minute(), 30);

    // Date-only formats land at midnight.
    let parsed = parse_deadline("07.03.2025").unwrap();
    assert_eq!(parsed.hour(), 0);
}

#[test]
fn unparseable_deadline_is_none_not_an_error() {
    assert!(parse_deadline("next tuesday").is_none());
    assert!(parse_deadline("2025-13-45").is_none());
    assert!(parse_deadline("").is_none());
}

#[test]
fn deadline_input_is_trimmed() {
    assert!(parse_deadline("  2025-03-07  ").is_some());
}
