//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record and its weekday recurrence set.
//! - Validate user input before it reaches storage or scheduling.
//!
//! # Invariants
//! - Every reminder is identified by a stable `ReminderId` assigned by the store.
//! - An empty recurrence set means one-shot semantics.

pub mod recurrence;
pub mod reminder;
