//! Scheduling service.
//!
//! # Responsibility
//! - Keep exactly one pending series alarm per schedulable reminder.
//! - Re-arm recurring reminders when their alarm fires.
//! - Register snoozes without disturbing the series registration.
//!
//! # Invariants
//! - Bookkeeping changes only after the backend acknowledged the call it
//!   mirrors, so it always matches what the backend holds.
//! - A refused or failed registration leaves the previous one in place.
//! - Input errors (`InvalidDuration`, `NotFound`) are raised before any
//!   backend call.
//! - The service never retries a denied registration on its own.

use crate::config::CoreConfig;
use crate::model::reminder::{Reminder, ReminderId};
use crate::repo::reminder_repo::ReminderRepository;
use crate::schedule::backend::AlarmBackend;
use crate::schedule::clock::Clock;
use crate::schedule::error::{ScheduleError, ScheduleResult};
use crate::schedule::key::{AlarmPurpose, RegistrationKey};
use crate::schedule::notification::{NotificationContent, NotificationTemplate};
use crate::schedule::recurrence::{effective_fire_at, next_occurrence};
use crate::schedule::snooze::{resolve_snooze, SnoozeResolution};
use chrono::Duration;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Pending registrations of one reminder.
#[derive(Debug, Clone, Default)]
struct PendingAlarms {
    series: Option<i64>,
    /// Keyed by snooze bucket minutes.
    snoozes: BTreeMap<u32, i64>,
}

impl PendingAlarms {
    fn is_empty(&self) -> bool {
        self.series.is_none() && self.snoozes.is_empty()
    }
}

/// Result of handling one alarm delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireOutcome {
    /// Reminder state as loaded from the store at delivery time.
    pub reminder: Reminder,
    /// Content to post; `None` for completed reminders and duplicate deliveries.
    pub notification: Option<NotificationContent>,
    /// Series instant pending after this delivery, if any.
    pub next_fire_at_ms: Option<i64>,
    /// The delivery repeated one that was already handled.
    pub duplicate: bool,
}

/// Orchestrates recurrence, snooze and the external alarm backend.
pub struct SchedulingService<R: ReminderRepository, B: AlarmBackend, C: Clock> {
    repo: R,
    backend: B,
    clock: C,
    template: NotificationTemplate,
    pending: BTreeMap<ReminderId, PendingAlarms>,
    /// Last consumed instant per key, for duplicate detection.
    delivered: BTreeMap<RegistrationKey, i64>,
}

impl<R: ReminderRepository, B: AlarmBackend, C: Clock> SchedulingService<R, B, C> {
    pub fn new(repo: R, backend: B, clock: C) -> Self {
        Self::with_template(repo, backend, clock, NotificationTemplate::default())
    }

    pub fn with_config(repo: R, backend: B, clock: C, config: &CoreConfig) -> Self {
        Self::with_template(repo, backend, clock, config.notification_template())
    }

    pub fn with_template(repo: R, backend: B, clock: C, template: NotificationTemplate) -> Self {
        Self {
            repo,
            backend,
            clock,
            template,
            pending: BTreeMap::new(),
            delivered: BTreeMap::new(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Registers the series alarm for `reminder` at its effective next instant.
    ///
    /// Completed reminders are cancelled instead. On success the computed
    /// instant is written back to the store and pending snoozes are dropped,
    /// leaving exactly one registration for the id.
    ///
    /// Returns the registered instant, or `None` when nothing was scheduled.
    ///
    /// # Errors
    /// - `NotFound` when the reminder is not in the store.
    /// - `SchedulingDenied` when the host refuses precise alarms; the
    ///   previous registration is kept and the caller should retry after
    ///   obtaining authorization.
    pub fn schedule(&mut self, reminder: &Reminder) -> ScheduleResult<Option<i64>> {
        self.load(reminder.id)?;

        if !reminder.is_schedulable() {
            self.cancel(reminder.id)?;
            return Ok(None);
        }

        let now_ms = self.clock.now_ms();
        let fire_at_ms = effective_fire_at(self.clock.timezone(), reminder, now_ms);
        let key = RegistrationKey::series(reminder.id);

        self.register(&key, fire_at_ms)?;
        self.track(&key, fire_at_ms);
        self.delivered.remove(&key);

        if fire_at_ms != reminder.fire_at_ms {
            self.repo.set_fire_at(reminder.id, fire_at_ms)?;
        }
        self.cancel_snoozes(reminder.id)?;

        Ok(Some(fire_at_ms))
    }

    /// Removes every pending registration for `reminder_id`. Idempotent.
    ///
    /// Configured snooze buckets are cancelled even when untracked, so
    /// alarms registered before a restart are covered too.
    pub fn cancel(&mut self, reminder_id: ReminderId) -> ScheduleResult<()> {
        let mut keys = BTreeSet::from([RegistrationKey::series(reminder_id)]);
        keys.extend(
            self.template
                .snooze_presets_minutes()
                .iter()
                .map(|minutes| RegistrationKey::snooze(reminder_id, *minutes)),
        );
        keys.extend(self.tracked_snooze_keys(reminder_id));

        for key in &keys {
            self.cancel_key(key)?;
        }
        self.delivered.retain(|key, _| key.reminder_id != reminder_id);

        info!("event=reminder_cancel module=scheduler status=ok reminder_id={reminder_id}");
        Ok(())
    }

    /// Handles delivery of the series alarm for `reminder_id`.
    ///
    /// Recurring, open reminders get their following occurrence registered
    /// right away, strictly after the fired instant. One-shot reminders are
    /// not re-registered.
    ///
    /// # Errors
    /// - `NotFound` when the reminder no longer exists.
    /// - `SchedulingDenied` when the next occurrence could not be registered;
    ///   use [`Self::notification_for`] to still notify.
    pub fn on_fired(&mut self, reminder_id: ReminderId) -> ScheduleResult<FireOutcome> {
        let reminder = self.load(reminder_id)?;
        let now_ms = self.clock.now_ms();
        let series_key = RegistrationKey::series(reminder_id);
        let tracked = self.pending.get(&reminder_id).and_then(|p| p.series);

        let already_delivered = match tracked {
            Some(pending_at) => pending_at > now_ms,
            None => self.delivered.get(&series_key) == Some(&reminder.fire_at_ms),
        };
        if already_delivered {
            debug!(
                "event=alarm_fired module=scheduler status=duplicate reminder_id={reminder_id} now_ms={now_ms}"
            );
            return Ok(FireOutcome {
                reminder,
                notification: None,
                next_fire_at_ms: tracked,
                duplicate: true,
            });
        }

        let fired_at_ms = tracked.unwrap_or(reminder.fire_at_ms);
        self.forget(&series_key);
        self.delivered.insert(series_key, fired_at_ms);
        info!(
            "event=alarm_fired module=scheduler status=ok reminder_id={reminder_id} purpose=series fired_at_ms={fired_at_ms} delay_ms={}",
            now_ms.saturating_sub(fired_at_ms)
        );

        if reminder.is_completed {
            return Ok(FireOutcome {
                reminder,
                notification: None,
                next_fire_at_ms: None,
                duplicate: false,
            });
        }

        let notification = Some(self.template.render(&reminder));
        let next_fire_at_ms = if reminder.is_recurring() {
            let after_ms = now_ms.max(fired_at_ms.saturating_add(1));
            let next = next_occurrence(
                self.clock.timezone(),
                reminder.recurrence,
                reminder.anchor_ms,
                after_ms,
            );
            self.register(&series_key, next)?;
            self.track(&series_key, next);
            self.repo.set_fire_at(reminder_id, next)?;
            Some(next)
        } else {
            None
        };

        Ok(FireOutcome {
            reminder,
            notification,
            next_fire_at_ms,
            duplicate: false,
        })
    }

    /// Registers a one-shot snooze alarm `duration` from now.
    ///
    /// The series registration and its bookkeeping are left untouched.
    ///
    /// # Errors
    /// - `InvalidDuration` for non-positive durations.
    /// - `NotFound` for unknown reminders.
    /// - `SchedulingDenied` when the host refuses precise alarms.
    pub fn on_snooze_requested(
        &mut self,
        reminder_id: ReminderId,
        duration: Duration,
    ) -> ScheduleResult<SnoozeResolution> {
        let resolution = resolve_snooze(reminder_id, self.clock.now_ms(), duration)?;
        self.load(reminder_id)?;

        self.register(&resolution.key, resolution.fire_at_ms)?;
        self.track(&resolution.key, resolution.fire_at_ms);
        self.delivered.remove(&resolution.key);
        Ok(resolution)
    }

    /// Dispatches a delivered alarm by its key purpose.
    pub fn on_alarm(&mut self, key: &RegistrationKey) -> ScheduleResult<FireOutcome> {
        match key.purpose {
            AlarmPurpose::Series => self.on_fired(key.reminder_id),
            AlarmPurpose::Snooze { minutes } => self.on_snooze_fired(key, minutes),
        }
    }

    /// Notification content for `reminder_id` from current store state.
    pub fn notification_for(&self, reminder_id: ReminderId) -> ScheduleResult<NotificationContent> {
        let reminder = self.load(reminder_id)?;
        Ok(self.template.render(&reminder))
    }

    /// Pending registrations for one reminder, ordered by key.
    pub fn pending_registrations(&self, reminder_id: ReminderId) -> Vec<(RegistrationKey, i64)> {
        let Some(pending) = self.pending.get(&reminder_id) else {
            return Vec::new();
        };
        let series = pending
            .series
            .map(|fire_at_ms| (RegistrationKey::series(reminder_id), fire_at_ms));
        let snoozes = pending.snoozes.iter().map(|(minutes, fire_at_ms)| {
            (RegistrationKey::snooze(reminder_id, *minutes), *fire_at_ms)
        });
        series.into_iter().chain(snoozes).collect()
    }

    /// Total pending registrations across all reminders.
    pub fn pending_count(&self) -> usize {
        self.pending
            .values()
            .map(|pending| usize::from(pending.series.is_some()) + pending.snoozes.len())
            .sum()
    }

    fn on_snooze_fired(
        &mut self,
        key: &RegistrationKey,
        minutes: u32,
    ) -> ScheduleResult<FireOutcome> {
        let reminder = self.load(key.reminder_id)?;
        let now_ms = self.clock.now_ms();
        let tracked = self
            .pending
            .get(&key.reminder_id)
            .and_then(|pending| pending.snoozes.get(&minutes).copied());
        let series_at = self.pending.get(&key.reminder_id).and_then(|p| p.series);

        // Either a later snooze in the same bucket replaced the one being
        // delivered, or this bucket was already consumed and nothing re-armed it.
        let already_delivered = match tracked {
            Some(pending_at) => pending_at > now_ms,
            None => self.delivered.contains_key(key),
        };
        if already_delivered {
            debug!(
                "event=alarm_fired module=scheduler status=duplicate reminder_id={} purpose=snooze minutes={minutes}",
                key.reminder_id
            );
            return Ok(FireOutcome {
                reminder,
                notification: None,
                next_fire_at_ms: series_at,
                duplicate: true,
            });
        }

        self.forget(key);
        self.delivered.insert(*key, tracked.unwrap_or(now_ms));
        info!(
            "event=alarm_fired module=scheduler status=ok reminder_id={} purpose=snooze minutes={minutes}",
            key.reminder_id
        );

        let notification = (!reminder.is_completed).then(|| self.template.render(&reminder));
        Ok(FireOutcome {
            reminder,
            notification,
            next_fire_at_ms: series_at,
            duplicate: false,
        })
    }

    fn load(&self, reminder_id: ReminderId) -> ScheduleResult<Reminder> {
        self.repo
            .get_reminder(reminder_id)?
            .ok_or(ScheduleError::NotFound(reminder_id))
    }

    fn register(&self, key: &RegistrationKey, fire_at_ms: i64) -> ScheduleResult<()> {
        match self.backend.register(key, fire_at_ms) {
            Ok(()) => {
                info!(
                    "event=alarm_register module=scheduler status=ok key={key} fire_at_ms={fire_at_ms}"
                );
                Ok(())
            }
            Err(err) => {
                let err = ScheduleError::from_backend(*key, err);
                match &err {
                    ScheduleError::SchedulingDenied(_) => warn!(
                        "event=alarm_register module=scheduler status=denied key={key} fire_at_ms={fire_at_ms}"
                    ),
                    other => error!(
                        "event=alarm_register module=scheduler status=error key={key} error={other}"
                    ),
                }
                Err(err)
            }
        }
    }

    fn cancel_key(&mut self, key: &RegistrationKey) -> ScheduleResult<()> {
        if let Err(err) = self.backend.cancel(key) {
            error!("event=alarm_cancel module=scheduler status=error key={key} error={err}");
            return Err(ScheduleError::from_backend(*key, err));
        }
        self.forget(key);
        debug!("event=alarm_cancel module=scheduler status=ok key={key}");
        Ok(())
    }

    fn cancel_snoozes(&mut self, reminder_id: ReminderId) -> ScheduleResult<()> {
        for key in self.tracked_snooze_keys(reminder_id) {
            self.cancel_key(&key)?;
        }
        Ok(())
    }

    fn tracked_snooze_keys(&self, reminder_id: ReminderId) -> Vec<RegistrationKey> {
        self.pending
            .get(&reminder_id)
            .map(|pending| {
                pending
                    .snoozes
                    .keys()
                    .map(|minutes| RegistrationKey::snooze(reminder_id, *minutes))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn track(&mut self, key: &RegistrationKey, fire_at_ms: i64) {
        let pending = self.pending.entry(key.reminder_id).or_default();
        match key.purpose {
            AlarmPurpose::Series => pending.series = Some(fire_at_ms),
            AlarmPurpose::Snooze { minutes } => {
                pending.snoozes.insert(minutes, fire_at_ms);
            }
        }
    }

    fn forget(&mut self, key: &RegistrationKey) {
        let Some(pending) = self.pending.get_mut(&key.reminder_id) else {
            return;
        };
        match key.purpose {
            AlarmPurpose::Series => pending.series = None,
            AlarmPurpose::Snooze { minutes } => {
                pending.snoozes.remove(&minutes);
            }
        }
        if pending.is_empty() {
            self.pending.remove(&key.reminder_id);
        }
    }
}
