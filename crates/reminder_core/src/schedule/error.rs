//! Scheduling error taxonomy.

use crate::model::reminder::ReminderId;
use crate::repo::reminder_repo::RepoError;
use crate::schedule::backend::BackendError;
use crate::schedule::key::RegistrationKey;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors surfaced by snooze resolution and the scheduling service.
///
/// `InvalidDuration` and `NotFound` are raised before any state mutation.
/// `SchedulingDenied` leaves the previous registration in place; the caller
/// owns prompting for authorization and retrying.
#[derive(Debug)]
pub enum ScheduleError {
    /// Snooze duration was zero, negative, or overflowed the clock range.
    InvalidDuration { millis: i64 },
    /// Host refused precise scheduling for `key`.
    SchedulingDenied(RegistrationKey),
    /// Referenced reminder does not exist.
    NotFound(ReminderId),
    /// Host alarm service failed for another reason.
    Backend(BackendError),
    /// Reminder store failure.
    Repo(RepoError),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDuration { millis } => {
                write!(f, "snooze duration must be positive, got {millis}ms")
            }
            Self::SchedulingDenied(key) => {
                write!(f, "precise alarm scheduling denied for {key}")
            }
            Self::NotFound(id) => write!(f, "reminder not found: {id}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidDuration { .. } | Self::SchedulingDenied(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for ScheduleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl ScheduleError {
    /// Maps a backend answer for `key` into the scheduling taxonomy.
    pub(crate) fn from_backend(key: RegistrationKey, err: BackendError) -> Self {
        match err {
            BackendError::Denied => Self::SchedulingDenied(key),
            other => Self::Backend(other),
        }
    }
}
