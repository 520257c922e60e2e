//! Reminder use-case service.
//!
//! # Responsibility
//! - Provide create/edit/complete/delete entry points for host UIs.
//! - Keep the store and the alarm backend consistent across those flows.
//!
//! # Invariants
//! - Drafts are validated before any store or backend mutation.
//! - Edits are keyed updates; `id` survives every edit and toggle.
//! - Alarms are only replaced when fire time or recurrence changed.
//! - Deleting cancels pending alarms before the row is removed.

use crate::model::reminder::{Reminder, ReminderDraft, ReminderId, ReminderValidationError};
use crate::repo::reminder_repo::{RepoError, ReminderListQuery, ReminderRepository};
use crate::schedule::backend::AlarmBackend;
use crate::schedule::clock::Clock;
use crate::schedule::error::ScheduleError;
use crate::schedule::key::RegistrationKey;
use crate::schedule::snooze::SnoozeResolution;
use crate::service::scheduling_service::{FireOutcome, SchedulingService};
use chrono::Duration;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReminderServiceResult<T> = Result<T, ReminderServiceError>;

/// Service error for reminder use-cases.
#[derive(Debug)]
pub enum ReminderServiceError {
    /// Draft input was rejected.
    Validation(ReminderValidationError),
    /// Target reminder does not exist.
    NotFound(ReminderId),
    /// Scheduling failed; `SchedulingDenied` means the caller should obtain
    /// precise-alarm authorization and call `reschedule`.
    Schedule(ScheduleError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back did not find the row.
    InconsistentState(&'static str),
}

impl Display for ReminderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "reminder not found: {id}"),
            Self::Schedule(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent reminder state: {details}")
            }
        }
    }
}

impl Error for ReminderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Schedule(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::InconsistentState(_) => None,
        }
    }
}

impl From<ReminderValidationError> for ReminderServiceError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ReminderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ScheduleError> for ReminderServiceError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::NotFound(id) => Self::NotFound(id),
            other => Self::Schedule(other),
        }
    }
}

impl ReminderServiceError {
    /// True when the host must ask for precise-alarm authorization.
    pub fn is_scheduling_denied(&self) -> bool {
        matches!(self, Self::Schedule(ScheduleError::SchedulingDenied(_)))
    }
}

/// Use-case facade over the reminder store and the scheduler.
pub struct ReminderService<R: ReminderRepository, B: AlarmBackend, C: Clock> {
    scheduler: SchedulingService<R, B, C>,
}

impl<R: ReminderRepository, B: AlarmBackend, C: Clock> ReminderService<R, B, C> {
    pub fn new(scheduler: SchedulingService<R, B, C>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &SchedulingService<R, B, C> {
        &self.scheduler
    }

    /// Saves a new reminder and schedules it.
    ///
    /// When scheduling is denied the reminder stays saved without an alarm;
    /// the error tells the caller to authorize and call `reschedule`.
    pub fn create_reminder(&mut self, draft: &ReminderDraft) -> ReminderServiceResult<Reminder> {
        draft.validate()?;

        let reminder = self.scheduler.repo().create_reminder(draft)?;
        info!(
            "event=reminder_create module=service status=ok reminder_id={} recurring={}",
            reminder.id,
            reminder.is_recurring()
        );

        self.scheduler.schedule(&reminder)?;
        self.read_back(reminder.id, "created reminder not found in read-back")
    }

    /// Applies an edit in place, keeping `id` and completion state.
    ///
    /// The alarm is replaced only when fire time or recurrence changed; a
    /// denied replacement leaves both the store and the old alarm untouched.
    pub fn edit_reminder(
        &mut self,
        reminder_id: ReminderId,
        draft: &ReminderDraft,
    ) -> ReminderServiceResult<Reminder> {
        draft.validate()?;

        let mut reminder = self.load(reminder_id)?;
        let schedule_changed = reminder.apply_draft(draft);

        if schedule_changed && reminder.is_schedulable() {
            if let Some(fire_at_ms) = self.scheduler.schedule(&reminder)? {
                reminder.fire_at_ms = fire_at_ms;
            }
        }
        self.scheduler.repo().update_reminder(&reminder)?;

        info!(
            "event=reminder_edit module=service status=ok reminder_id={reminder_id} rescheduled={schedule_changed}"
        );
        self.read_back(reminder_id, "edited reminder not found in read-back")
    }

    /// Flips completion. Completing cancels alarms; reopening schedules again.
    pub fn toggle_completion(&mut self, reminder_id: ReminderId) -> ReminderServiceResult<Reminder> {
        let mut reminder = self.load(reminder_id)?;
        reminder.is_completed = !reminder.is_completed;

        if reminder.is_completed {
            self.scheduler.cancel(reminder_id)?;
        } else if let Some(fire_at_ms) = self.scheduler.schedule(&reminder)? {
            reminder.fire_at_ms = fire_at_ms;
        }
        self.scheduler.repo().update_reminder(&reminder)?;

        info!(
            "event=reminder_toggle module=service status=ok reminder_id={reminder_id} completed={}",
            reminder.is_completed
        );
        Ok(reminder)
    }

    /// Cancels every pending alarm for the reminder, then deletes it.
    pub fn delete_reminder(&mut self, reminder_id: ReminderId) -> ReminderServiceResult<()> {
        self.load(reminder_id)?;
        self.scheduler.cancel(reminder_id)?;
        self.scheduler.repo().delete_reminder(reminder_id)?;

        info!("event=reminder_delete module=service status=ok reminder_id={reminder_id}");
        Ok(())
    }

    /// Schedules a stored reminder again, e.g. after authorization was granted.
    pub fn reschedule(&mut self, reminder_id: ReminderId) -> ReminderServiceResult<Reminder> {
        let reminder = self.load(reminder_id)?;
        self.scheduler.schedule(&reminder)?;
        self.read_back(reminder_id, "rescheduled reminder not found in read-back")
    }

    /// Re-registers every open reminder, e.g. after a device reboot cleared
    /// the host's alarm table. Returns how many were scheduled.
    ///
    /// Stops at the first failure; already processed reminders stay scheduled.
    pub fn reschedule_all(&mut self) -> ReminderServiceResult<usize> {
        let open = self.scheduler.repo().list_reminders(&ReminderListQuery {
            only_pending: true,
            ..ReminderListQuery::default()
        })?;

        let mut scheduled = 0;
        for reminder in &open {
            if self.scheduler.schedule(reminder)?.is_some() {
                scheduled += 1;
            }
        }

        info!("event=reminder_restore module=service status=ok scheduled={scheduled}");
        Ok(scheduled)
    }

    pub fn get_reminder(&self, reminder_id: ReminderId) -> ReminderServiceResult<Option<Reminder>> {
        Ok(self.scheduler.repo().get_reminder(reminder_id)?)
    }

    pub fn list_reminders(&self, query: &ReminderListQuery) -> ReminderServiceResult<Vec<Reminder>> {
        Ok(self.scheduler.repo().list_reminders(query)?)
    }

    /// Delivery callback for the series alarm of `reminder_id`.
    pub fn on_fired(&mut self, reminder_id: ReminderId) -> ReminderServiceResult<FireOutcome> {
        Ok(self.scheduler.on_fired(reminder_id)?)
    }

    /// Delivery callback for any alarm key.
    pub fn on_alarm(&mut self, key: &RegistrationKey) -> ReminderServiceResult<FireOutcome> {
        Ok(self.scheduler.on_alarm(key)?)
    }

    /// Snooze action callback.
    pub fn on_snooze_requested(
        &mut self,
        reminder_id: ReminderId,
        duration: Duration,
    ) -> ReminderServiceResult<SnoozeResolution> {
        Ok(self.scheduler.on_snooze_requested(reminder_id, duration)?)
    }

    fn load(&self, reminder_id: ReminderId) -> ReminderServiceResult<Reminder> {
        self.scheduler
            .repo()
            .get_reminder(reminder_id)?
            .ok_or(ReminderServiceError::NotFound(reminder_id))
    }

    fn read_back(
        &self,
        reminder_id: ReminderId,
        details: &'static str,
    ) -> ReminderServiceResult<Reminder> {
        self.scheduler
            .repo()
            .get_reminder(reminder_id)?
            .ok_or(ReminderServiceError::InconsistentState(details))
    }
}
