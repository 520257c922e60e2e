//! Scheduling decision logic.
//!
//! # Responsibility
//! - Compute next fire instants for one-shot and weekly-recurring reminders.
//! - Resolve snooze requests into distinct, deterministic registrations.
//! - Define the contract of the external alarm backend and the clock.
//!
//! # Invariants
//! - Everything here is pure or side-effect free apart from the backend
//!   implementations; orchestration lives in `service::scheduling_service`.

pub mod backend;
pub mod clock;
pub mod error;
pub mod key;
pub mod notification;
pub mod recurrence;
pub mod snooze;
