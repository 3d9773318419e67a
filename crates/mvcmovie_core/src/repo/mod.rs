//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for movies.
//! - Isolate SQLite query details from service/request orchestration.
//!
//! # Invariants
//! - Repository writes must pass `validate_movie()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `ConcurrencyConflict`) in addition to DB transport errors.

pub mod movie_repo;
