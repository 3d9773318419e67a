//! Request layer over the movie record store.
//!
//! # Responsibility
//! - Bind raw request values, enforce request preconditions and shape the
//!   view models rendered by presentation hosts (the CLI today).
//!
//! # Invariants
//! - Controllers never hold a connection beyond the request/command that
//!   created them.

pub mod antiforgery;
pub mod form;
pub mod hello_world;
pub mod model_state;
pub mod movies;
