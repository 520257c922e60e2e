//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the keyed reminder store contract used by services.
//! - Isolate SQLite query details from scheduling orchestration.
//!
//! # Invariants
//! - Create paths validate drafts before any SQL mutation.
//! - Updates are keyed by `id`; identity is never re-assigned.

pub mod reminder_repo;
