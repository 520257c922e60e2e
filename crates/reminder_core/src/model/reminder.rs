//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record shared by storage and scheduling.
//! - Validate editor input (`ReminderDraft`) before persistence.
//!
//! # Invariants
//! - `id` is assigned once by the store and never reused for another reminder.
//! - `fire_at_ms` mirrors the instant of the pending series alarm, if any.
//! - `anchor_ms` keeps the instant the user picked; recurring occurrences
//!   take their local time-of-day from it, never from `fire_at_ms`.
//! - Title/description non-emptiness is enforced on drafts, not on `Reminder`.

use crate::model::recurrence::RecurrenceDays;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable store-assigned identifier, reused for every alarm registration
/// referencing the reminder.
pub type ReminderId = i64;

/// Canonical reminder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    pub description: String,
    /// Unix epoch milliseconds of the next intended notification.
    pub fire_at_ms: i64,
    /// Instant entered by the user. Only rewritten by edits.
    pub anchor_ms: i64,
    pub is_completed: bool,
    /// Empty set means one-shot.
    #[serde(default)]
    pub recurrence: RecurrenceDays,
}

impl Reminder {
    /// Materializes a stored reminder from a validated draft.
    pub fn from_draft(id: ReminderId, draft: &ReminderDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            fire_at_ms: draft.fire_at_ms,
            anchor_ms: draft.fire_at_ms,
            is_completed: false,
            recurrence: draft.recurrence,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !self.recurrence.is_empty()
    }

    /// Returns whether the scheduler should keep an alarm pending for this
    /// reminder.
    pub fn is_schedulable(&self) -> bool {
        !self.is_completed
    }

    /// Applies an edit while preserving identity and completion state.
    ///
    /// Returns `true` when the change affects scheduling (fire time or
    /// recurrence), i.e. the pending alarm must be replaced.
    ///
    /// A draft time equal to either the anchor or the current fire instant
    /// counts as unchanged, so editors may echo back whichever they showed.
    pub fn apply_draft(&mut self, draft: &ReminderDraft) -> bool {
        let time_changed =
            draft.fire_at_ms != self.fire_at_ms && draft.fire_at_ms != self.anchor_ms;
        let schedule_changed = time_changed || self.recurrence != draft.recurrence;

        self.title = draft.title.clone();
        self.description = draft.description.clone();
        if time_changed {
            self.anchor_ms = draft.fire_at_ms;
        }
        if schedule_changed {
            self.fire_at_ms = draft.fire_at_ms;
        }
        self.recurrence = draft.recurrence;
        schedule_changed
    }
}

/// Editor input for creating or editing a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub title: String,
    pub description: String,
    pub fire_at_ms: i64,
    pub recurrence: RecurrenceDays,
}

impl ReminderDraft {
    /// Creates a one-shot draft.
    pub fn new(title: impl Into<String>, description: impl Into<String>, fire_at_ms: i64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fire_at_ms,
            recurrence: RecurrenceDays::none(),
        }
    }

    pub fn with_recurrence(mut self, recurrence: RecurrenceDays) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Checks that title and description carry visible text.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is blank after trimming.
    /// - `EmptyDescription` when the description is blank after trimming.
    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.title.trim().is_empty() {
            return Err(ReminderValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ReminderValidationError::EmptyDescription);
        }
        Ok(())
    }
}

/// Draft validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderValidationError {
    EmptyTitle,
    EmptyDescription,
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "reminder title must not be empty"),
            Self::EmptyDescription => write!(f, "reminder description must not be empty"),
        }
    }
}

impl Error for ReminderValidationError {}

#[cfg(test)]
mod tests {
    use super::{Reminder, ReminderDraft, ReminderValidationError};
    use crate::model::recurrence::RecurrenceDays;
    use chrono::Weekday;

    #[test]
    fn validate_rejects_blank_fields() {
        let draft = ReminderDraft::new("  ", "water plants", 1_000);
        assert_eq!(draft.validate(), Err(ReminderValidationError::EmptyTitle));

        let draft = ReminderDraft::new("Plants", "\n", 1_000);
        assert_eq!(
            draft.validate(),
            Err(ReminderValidationError::EmptyDescription)
        );
    }

    #[test]
    fn apply_draft_reports_schedule_relevant_changes_only() {
        let draft = ReminderDraft::new("Plants", "water them", 1_000);
        let mut reminder = Reminder::from_draft(7, &draft);

        let retitled = ReminderDraft::new("Garden", "water them", 1_000);
        assert!(!reminder.apply_draft(&retitled));
        assert_eq!(reminder.title, "Garden");
        assert_eq!(reminder.id, 7);

        let recurring = retitled.with_recurrence(RecurrenceDays::from_days([Weekday::Sun]));
        assert!(reminder.apply_draft(&recurring));
        assert!(reminder.is_recurring());
        assert_eq!(reminder.anchor_ms, 1_000);
    }

    #[test]
    fn apply_draft_keeps_anchor_when_editor_echoes_next_fire_time() {
        let draft = ReminderDraft::new("Gym", "legs", 1_000)
            .with_recurrence(RecurrenceDays::from_days([Weekday::Mon]));
        let mut reminder = Reminder::from_draft(3, &draft);
        reminder.fire_at_ms = 605_000;

        let echoed = ReminderDraft::new("Gym", "arms", 605_000)
            .with_recurrence(RecurrenceDays::from_days([Weekday::Mon]));
        assert!(!reminder.apply_draft(&echoed));
        assert_eq!(reminder.anchor_ms, 1_000);
        assert_eq!(reminder.fire_at_ms, 605_000);

        let moved = ReminderDraft::new("Gym", "arms", 2_000)
            .with_recurrence(RecurrenceDays::from_days([Weekday::Mon]));
        assert!(reminder.apply_draft(&moved));
        assert_eq!(reminder.anchor_ms, 2_000);
        assert_eq!(reminder.fire_at_ms, 2_000);
    }
}
