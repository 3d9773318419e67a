//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into record-store APIs.
//! - Keep request and presentation layers decoupled from storage details.

pub mod movie_service;
