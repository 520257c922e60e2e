//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, clock and alarm backend into host-facing APIs.
//! - Keep UI/FFI layers decoupled from storage and scheduling details.

pub mod reminder_service;
pub mod scheduling_service;
