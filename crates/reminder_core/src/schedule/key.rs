//! Registration keys for pending alarms.
//!
//! # Responsibility
//! - Derive deterministic alarm identities from `(reminder id, purpose)`.
//! - Render/parse the textual form hosts attach to delivery payloads.
//!
//! # Invariants
//! - Series and snooze keys of one reminder never compare equal.
//! - Snooze keys of different duration buckets never compare equal.
//! - `request_code` is injective for ids below 2^47.

use crate::model::reminder::ReminderId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const KEY_PREFIX: &str = "reminder";

/// Largest snooze bucket, in minutes. Longer snoozes share this bucket.
pub const MAX_SNOOZE_BUCKET_MINUTES: u32 = u16::MAX as u32;

/// Why an alarm is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlarmPurpose {
    /// Primary one-shot or recurring schedule.
    Series,
    /// Transient copy created by a snooze action, bucketed by whole minutes.
    Snooze { minutes: u32 },
}

/// Identity of one pending alarm in the external backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistrationKey {
    pub reminder_id: ReminderId,
    pub purpose: AlarmPurpose,
}

impl RegistrationKey {
    pub fn series(reminder_id: ReminderId) -> Self {
        Self {
            reminder_id,
            purpose: AlarmPurpose::Series,
        }
    }

    /// Builds a snooze key; `minutes` is clamped into `1..=MAX_SNOOZE_BUCKET_MINUTES`.
    pub fn snooze(reminder_id: ReminderId, minutes: u32) -> Self {
        Self {
            reminder_id,
            purpose: AlarmPurpose::Snooze {
                minutes: minutes.clamp(1, MAX_SNOOZE_BUCKET_MINUTES),
            },
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self.purpose, AlarmPurpose::Series)
    }

    /// Stable integer identity for backends that key alarms by number.
    ///
    /// Layout: reminder id in the high bits, purpose slot in the low 16 bits
    /// (`0` for series, bucket minutes for snoozes).
    pub fn request_code(&self) -> i64 {
        let slot = match self.purpose {
            AlarmPurpose::Series => 0,
            AlarmPurpose::Snooze { minutes } => i64::from(minutes),
        };
        self.reminder_id.wrapping_shl(16) | slot
    }
}

impl Display for RegistrationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.purpose {
            AlarmPurpose::Series => write!(f, "{KEY_PREFIX}:{}:series", self.reminder_id),
            AlarmPurpose::Snooze { minutes } => {
                write!(f, "{KEY_PREFIX}:{}:snooze:{minutes}m", self.reminder_id)
            }
        }
    }
}

/// Textual key could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParseError(pub String);

impl Display for KeyParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid registration key: `{}`", self.0)
    }
}

impl Error for KeyParseError {}

impl FromStr for RegistrationKey {
    type Err = KeyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || KeyParseError(value.to_string());
        let mut parts = value.trim().split(':');

        if parts.next() != Some(KEY_PREFIX) {
            return Err(invalid());
        }
        let reminder_id = parts
            .next()
            .and_then(|id| id.parse::<ReminderId>().ok())
            .ok_or_else(invalid)?;

        let key = match (parts.next(), parts.next()) {
            (Some("series"), None) => Self::series(reminder_id),
            (Some("snooze"), Some(bucket)) => {
                let minutes = bucket
                    .strip_suffix('m')
                    .and_then(|minutes| minutes.parse::<u32>().ok())
                    .filter(|minutes| (1..=MAX_SNOOZE_BUCKET_MINUTES).contains(minutes))
                    .ok_or_else(invalid)?;
                Self::snooze(reminder_id, minutes)
            }
            _ => return Err(invalid()),
        };

        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(key)
    }
}
