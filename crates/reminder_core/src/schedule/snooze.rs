//! Snooze resolution.
//!
//! # Invariants
//! - For every positive duration `d`, the resolved instant is exactly `now + d`.
//! - Non-positive durations are rejected with `InvalidDuration`.
//! - Each whole-minute bucket maps to its own snooze key, so pressing one
//!   snooze action never overwrites another action's pending alarm.

use crate::model::reminder::ReminderId;
use crate::schedule::error::{ScheduleError, ScheduleResult};
use crate::schedule::key::{RegistrationKey, MAX_SNOOZE_BUCKET_MINUTES};
use chrono::Duration;

/// Default snooze actions offered on a fired reminder, in minutes.
pub const DEFAULT_SNOOZE_PRESETS_MINUTES: [u32; 3] = [5, 10, 15];

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Where and under which key a snoozed reminder fires again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnoozeResolution {
    pub key: RegistrationKey,
    pub fire_at_ms: i64,
}

/// Resolves a snooze of `duration` requested at `now_ms`.
///
/// # Errors
/// - `InvalidDuration` when `duration <= 0` or `now + duration` overflows.
pub fn resolve_snooze(
    reminder_id: ReminderId,
    now_ms: i64,
    duration: Duration,
) -> ScheduleResult<SnoozeResolution> {
    let millis = duration.num_milliseconds();
    if millis <= 0 {
        return Err(ScheduleError::InvalidDuration { millis });
    }
    let fire_at_ms = now_ms
        .checked_add(millis)
        .ok_or(ScheduleError::InvalidDuration { millis })?;

    Ok(SnoozeResolution {
        key: RegistrationKey::snooze(reminder_id, snooze_bucket_minutes(duration)),
        fire_at_ms,
    })
}

/// Whole minutes, rounded up, clamped to the key's bucket range.
pub fn snooze_bucket_minutes(duration: Duration) -> u32 {
    let millis = duration.num_milliseconds().max(1);
    let minutes = millis / MILLIS_PER_MINUTE + i64::from(millis % MILLIS_PER_MINUTE != 0);
    u32::try_from(minutes)
        .unwrap_or(MAX_SNOOZE_BUCKET_MINUTES)
        .clamp(1, MAX_SNOOZE_BUCKET_MINUTES)
}
