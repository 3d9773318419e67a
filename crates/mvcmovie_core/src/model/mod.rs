//! Movie domain model and write-time validation.
//!
//! # Responsibility
//! - Define canonical data structures used by the record store.
//! - Keep validation rules independent of request binding.
//!
//! # Invariants
//! - Every persisted movie is identified by a storage-assigned `MovieId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod movie;
pub mod validation;
