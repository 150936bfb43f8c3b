//! Natural-language time-expression parsing.
//!
//! Maps a small closed set of phrases ("yesterday", "this week", "last 2
//! weeks", ...) to absolute time ranges relative to a supplied `now`. Both
//! bounds are inclusive. This is a lookup table, not an NLP parser — an
//! unrecognized phrase returns `None` and callers must surface that to the
//! user rather than silently returning nothing.

use chrono::{Datelike, Duration, NaiveDateTime};

/// An inclusive `[start, end]` wall-clock range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// True when `t` lies within the range, both bounds inclusive.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Parse a natural-language time phrase into a [`TimeRange`].
///
/// Matching is case-insensitive and whitespace-trimmed. Calendar-anchored
/// phrases ("today", "yesterday", "this week", "this month") use wall-clock
/// midnight boundaries; sliding phrases ("last week", "last month",
/// "last 2 weeks") are fixed offsets back from `now`.
pub fn parse_time_expression(query: &str, now: NaiveDateTime) -> Option<TimeRange> {
    let phrase = query.trim().to_lowercase();

    match phrase.as_str() {
        "today" => Some(TimeRange {
            start: midnight(now),
            end: now,
        }),
        "yesterday" => {
            let day = now - Duration::days(1);
            Some(TimeRange {
                start: midnight(day),
                end: end_of_day(day),
            })
        }
        "this week" => {
            let days_since_monday = i64::from(now.weekday().num_days_from_monday());
            Some(TimeRange {
                start: midnight(now - Duration::days(days_since_monday)),
                end: now,
            })
        }
        "this month" => {
            let first = now
                .date()
                .with_day(1)
                .expect("day 1 exists in every month")
                .and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time");
            Some(TimeRange { start: first, end: now })
        }
        "last week" | "past week" => Some(TimeRange {
            start: now - Duration::weeks(1),
            end: now,
        }),
        "last month" | "past month" => Some(TimeRange {
            start: now - Duration::days(30),
            end: now,
        }),
        "last 2 weeks" | "past 2 weeks" => Some(TimeRange {
            start: now - Duration::weeks(2),
            end: now,
        }),
        _ => None,
    }
}

fn midnight(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_hms_opt(0, 0, 0).expect("midnight is a valid time")
}

fn end_of_day(t: NaiveDateTime) -> NaiveDateTime {
    t.date()
        .and_hms_opt(23, 59, 59)
        .expect("23:59:59 is a valid time")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    // 2024-03-15 is a Friday.
    fn now() -> NaiveDateTime {
        at(2024, 3, 15, 10, 0, 0)
    }

    #[test]
    fn today_spans_midnight_to_now() {
        let range = parse_time_expression("today", now()).unwrap();
        assert_eq!(range.start, at(2024, 3, 15, 0, 0, 0));
        assert_eq!(range.end, now());
    }

    #[test]
    fn yesterday_is_full_previous_day() {
        let range = parse_time_expression("yesterday", now()).unwrap();
        assert_eq!(range.start, at(2024, 3, 14, 0, 0, 0));
        assert_eq!(range.end, at(2024, 3, 14, 23, 59, 59));
    }

    #[test]
    fn this_week_starts_most_recent_monday() {
        let range = parse_time_expression("this week", now()).unwrap();
        // Monday of that week is 2024-03-11.
        assert_eq!(range.start, at(2024, 3, 11, 0, 0, 0));
        assert_eq!(range.end, now());
    }

    #[test]
    fn this_month_starts_on_the_first() {
        let range = parse_time_expression("this month", now()).unwrap();
        assert_eq!(range.start, at(2024, 3, 1, 0, 0, 0));
        assert_eq!(range.end, now());
    }

    #[test]
    fn sliding_windows() {
        let range = parse_time_expression("last week", now()).unwrap();
        assert_eq!(range.start, at(2024, 3, 8, 10, 0, 0));

        let range = parse_time_expression("past month", now()).unwrap();
        assert_eq!(range.start, at(2024, 2, 14, 10, 0, 0));

        let range = parse_time_expression("last 2 weeks", now()).unwrap();
        assert_eq!(range.start, at(2024, 3, 1, 10, 0, 0));
        assert_eq!(range.end, now());
    }

    #[test]
    fn matching_is_case_insensitive_and_trimmed() {
        assert!(parse_time_expression("  Yesterday ", now()).is_some());
        assert!(parse_time_expression("THIS WEEK", now()).is_some());
    }

    #[test]
    fn unrecognized_phrase_returns_none() {
        assert!(parse_time_expression("gibberish", now()).is_none());
        assert!(parse_time_expression("", now()).is_none());
        assert!(parse_time_expression("three fortnights ago", now()).is_none());
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = parse_time_expression("yesterday", now()).unwrap();
        assert!(range.contains(at(2024, 3, 14, 0, 0, 0)));
        assert!(range.contains(at(2024, 3, 14, 23, 59, 59)));
        assert!(!range.contains(at(2024, 3, 15, 0, 0, 0)));
        assert!(!range.contains(at(2024, 3, 13, 23, 59, 59)));
    }
}
