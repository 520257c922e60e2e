//! Notification content for fired reminders.
//!
//! The host renders and posts the notification; the core only decides the
//! text and which snooze actions to offer.

use crate::model::reminder::{Reminder, ReminderId};
use crate::schedule::key::RegistrationKey;
use crate::schedule::snooze::DEFAULT_SNOOZE_PRESETS_MINUTES;
use serde::Serialize;

/// Body used when a reminder has no usable description.
pub const DEFAULT_NOTIFICATION_BODY: &str = "Time for your task!";

const FALLBACK_TITLE: &str = "Reminder";

/// One snooze button on a fired notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnoozeAction {
    pub label: String,
    pub minutes: u32,
    /// Key the snoozed alarm is registered under once this action is chosen.
    pub key: RegistrationKey,
}

/// What the host should show when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationContent {
    pub reminder_id: ReminderId,
    pub title: String,
    pub body: String,
    pub actions: Vec<SnoozeAction>,
}

/// Builds notification content from reminder state and configured presets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    snooze_presets_minutes: Vec<u32>,
    default_body: String,
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SNOOZE_PRESETS_MINUTES.to_vec(), DEFAULT_NOTIFICATION_BODY)
    }
}

impl NotificationTemplate {
    /// Zero presets are dropped; the rest are sorted and deduplicated.
    pub fn new(snooze_presets_minutes: Vec<u32>, default_body: impl Into<String>) -> Self {
        let mut presets: Vec<u32> = snooze_presets_minutes
            .into_iter()
            .filter(|minutes| *minutes > 0)
            .collect();
        presets.sort_unstable();
        presets.dedup();
        Self {
            snooze_presets_minutes: presets,
            default_body: default_body.into(),
        }
    }

    pub fn snooze_presets_minutes(&self) -> &[u32] {
        &self.snooze_presets_minutes
    }

    pub fn render(&self, reminder: &Reminder) -> NotificationContent {
        let title = non_blank(&reminder.title).unwrap_or(FALLBACK_TITLE);
        let body = non_blank(&reminder.description).unwrap_or(self.default_body.as_str());
        let actions = self
            .snooze_presets_minutes
            .iter()
            .map(|minutes| SnoozeAction {
                label: format!("Snooze {minutes}m"),
                minutes: *minutes,
                key: RegistrationKey::snooze(reminder.id, *minutes),
            })
            .collect();

        NotificationContent {
            reminder_id: reminder.id,
            title: title.to_string(),
            body: body.to_string(),
            actions,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationTemplate, DEFAULT_NOTIFICATION_BODY};
    use crate::model::recurrence::RecurrenceDays;
    use crate::model::reminder::Reminder;

    fn reminder(title: &str, description: &str) -> Reminder {
        Reminder {
            id: 11,
            title: title.to_string(),
            description: description.to_string(),
            fire_at_ms: 0,
            anchor_ms: 0,
            is_completed: false,
            recurrence: RecurrenceDays::none(),
        }
    }

    #[test]
    fn default_template_offers_three_snoozes() {
        let content = NotificationTemplate::default().render(&reminder("Stretch", "Stand up"));
        assert_eq!(content.title, "Stretch");
        assert_eq!(content.body, "Stand up");
        let labels: Vec<&str> = content.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["Snooze 5m", "Snooze 10m", "Snooze 15m"]);
    }

    #[test]
    fn blank_text_falls_back() {
        let content = NotificationTemplate::default().render(&reminder(" ", ""));
        assert_eq!(content.title, "Reminder");
        assert_eq!(content.body, DEFAULT_NOTIFICATION_BODY);
    }

    #[test]
    fn presets_are_normalized() {
        let template = NotificationTemplate::new(vec![15, 0, 5, 15], "Go");
        assert_eq!(template.snooze_presets_minutes(), [5, 15]);
    }
}
