//! Core domain logic for reminder scheduling.
//!
//! Decides when reminders fire, how snoozes re-arm them and which alarms a
//! host must keep registered. Rendering, OS alarm delivery and permission
//! prompts stay in the host.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::recurrence::RecurrenceDays;
pub use model::reminder::{Reminder, ReminderDraft, ReminderId, ReminderValidationError};
pub use repo::reminder_repo::{
    ReminderListQuery, ReminderRepository, RepoError, RepoResult, SqliteReminderRepository,
};
pub use schedule::backend::{AlarmBackend, BackendError, InMemoryAlarmBackend};
pub use schedule::clock::{Clock, ManualClock, SystemClock};
pub use schedule::error::{ScheduleError, ScheduleResult};
pub use schedule::key::{AlarmPurpose, KeyParseError, RegistrationKey};
pub use schedule::notification::{NotificationContent, NotificationTemplate, SnoozeAction};
pub use schedule::recurrence::{effective_fire_at, next_occurrence};
pub use schedule::snooze::{resolve_snooze, SnoozeResolution, DEFAULT_SNOOZE_PRESETS_MINUTES};
pub use service::reminder_service::{
    ReminderService, ReminderServiceError, ReminderServiceResult,
};
pub use service::scheduling_service::{FireOutcome, SchedulingService};
