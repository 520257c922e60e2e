//! Next-occurrence calculation for weekly recurrence.
//!
//! # Invariants
//! - For a non-empty set, the result's local weekday is in the set and the
//!   result is `>= now`.
//! - Today wins when it matches and the anchor time-of-day has not passed.
//! - At most 7 day-steps past today are examined.

use crate::model::recurrence::RecurrenceDays;
use crate::model::reminder::Reminder;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDateTime, TimeZone, Utc};

const MAX_DAY_STEPS: u64 = 7;

/// Returns the next instant at or after `now_ms` whose local weekday is in
/// `recurrence` and whose local time-of-day equals that of `anchor_ms`.
///
/// An empty set means one-shot: `anchor_ms` is returned unchanged.
pub fn next_occurrence<Tz: TimeZone>(
    tz: &Tz,
    recurrence: RecurrenceDays,
    anchor_ms: i64,
    now_ms: i64,
) -> i64 {
    if recurrence.is_empty() {
        return anchor_ms;
    }
    let (Some(anchor), Some(now)) = (
        DateTime::<Utc>::from_timestamp_millis(anchor_ms),
        DateTime::<Utc>::from_timestamp_millis(now_ms),
    ) else {
        return anchor_ms;
    };

    let time_of_day = anchor.with_timezone(tz).time();
    let today = now.with_timezone(tz).date_naive();

    for step in 0..=MAX_DAY_STEPS {
        let Some(date) = today.checked_add_days(Days::new(step)) else {
            break;
        };
        if !recurrence.contains(date.weekday()) {
            continue;
        }
        let candidate = resolve_local(tz, date.and_time(time_of_day)).timestamp_millis();
        if candidate >= now_ms {
            return candidate;
        }
    }

    anchor_ms
}

/// Effective fire instant for `reminder` as seen at `now_ms`.
///
/// One-shot reminders keep their stored instant. Recurring ones are
/// recomputed from the anchor, so a DST-shifted occurrence written back to
/// `fire_at_ms` never moves later occurrences.
pub fn effective_fire_at<Tz: TimeZone>(tz: &Tz, reminder: &Reminder, now_ms: i64) -> i64 {
    if reminder.is_recurring() {
        next_occurrence(tz, reminder.recurrence, reminder.anchor_ms, now_ms)
    } else {
        reminder.fire_at_ms
    }
}

// Ambiguous local times take the earlier instant; times inside a DST gap
// move forward by one hour.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&local))
}
