//! Alarm registration backend contract.
//!
//! # Responsibility
//! - Describe what the core needs from the host's alarm service.
//! - Provide an in-process backend for tests and headless hosts.
//!
//! # Invariants
//! - `register` under an existing key replaces that registration in full.
//! - `cancel` of an unknown key succeeds.

use crate::model::reminder::ReminderId;
use crate::schedule::key::RegistrationKey;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Host lacks authority to schedule precise alarms.
    Denied,
    /// Any other host failure.
    Failed(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Denied => write!(f, "precise alarm scheduling is not permitted"),
            Self::Failed(message) => write!(f, "alarm backend failure: {message}"),
        }
    }
}

impl Error for BackendError {}

/// Host alarm service used by the scheduling service.
pub trait AlarmBackend {
    /// Registers (or replaces) the alarm under `key` to fire at `fire_at_ms`.
    fn register(&self, key: &RegistrationKey, fire_at_ms: i64) -> Result<(), BackendError>;

    /// Removes the alarm under `key`; a missing key is not an error.
    fn cancel(&self, key: &RegistrationKey) -> Result<(), BackendError>;
}

/// In-process alarm table.
///
/// Precise scheduling can be revoked and single failures injected so callers
/// can exercise their error paths.
#[derive(Debug)]
pub struct InMemoryAlarmBackend {
    alarms: RefCell<BTreeMap<RegistrationKey, i64>>,
    exact_alarms_allowed: Cell<bool>,
    fail_next: RefCell<Option<String>>,
}

impl Default for InMemoryAlarmBackend {
    fn default() -> Self {
        Self {
            alarms: RefCell::new(BTreeMap::new()),
            exact_alarms_allowed: Cell::new(true),
            fail_next: RefCell::new(None),
        }
    }
}

impl InMemoryAlarmBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants or revokes precise scheduling; revoked registrations answer `Denied`.
    pub fn set_exact_alarms_allowed(&self, allowed: bool) {
        self.exact_alarms_allowed.set(allowed);
    }

    /// Makes the next `register` or `cancel` call fail with `message`.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        *self.fail_next.borrow_mut() = Some(message.into());
    }

    /// Instant registered under `key`, if any.
    pub fn fire_at(&self, key: &RegistrationKey) -> Option<i64> {
        self.alarms.borrow().get(key).copied()
    }

    /// All pending alarms ordered by key.
    pub fn pending(&self) -> Vec<(RegistrationKey, i64)> {
        self.alarms
            .borrow()
            .iter()
            .map(|(key, fire_at_ms)| (*key, *fire_at_ms))
            .collect()
    }

    /// Pending alarms for one reminder.
    pub fn pending_for(&self, reminder_id: ReminderId) -> Vec<(RegistrationKey, i64)> {
        self.pending()
            .into_iter()
            .filter(|(key, _)| key.reminder_id == reminder_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alarms.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.borrow().is_empty()
    }

    /// Simulates host delivery: removes and returns every alarm due at `now_ms`.
    pub fn take_due(&self, now_ms: i64) -> Vec<(RegistrationKey, i64)> {
        let mut alarms = self.alarms.borrow_mut();
        let due: Vec<(RegistrationKey, i64)> = alarms
            .iter()
            .filter(|(_, fire_at_ms)| **fire_at_ms <= now_ms)
            .map(|(key, fire_at_ms)| (*key, *fire_at_ms))
            .collect();
        for (key, _) in &due {
            alarms.remove(key);
        }
        due
    }

    fn take_injected_failure(&self) -> Result<(), BackendError> {
        match self.fail_next.borrow_mut().take() {
            Some(message) => Err(BackendError::Failed(message)),
            None => Ok(()),
        }
    }
}

impl AlarmBackend for InMemoryAlarmBackend {
    fn register(&self, key: &RegistrationKey, fire_at_ms: i64) -> Result<(), BackendError> {
        self.take_injected_failure()?;
        if !self.exact_alarms_allowed.get() {
            return Err(BackendError::Denied);
        }
        self.alarms.borrow_mut().insert(*key, fire_at_ms);
        Ok(())
    }

    fn cancel(&self, key: &RegistrationKey) -> Result<(), BackendError> {
        self.take_injected_failure()?;
        self.alarms.borrow_mut().remove(key);
        Ok(())
    }
}
