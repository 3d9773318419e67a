//! Core domain logic for the MvcMovie catalogue.
//! This crate is the single source of truth for movie invariants and the
//! optimistic-concurrency update protocol.

pub mod config;
pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use config::AppConfig;
pub use controller::antiforgery::{AntiForgery, AntiForgeryError};
pub use controller::form::{MovieForm, MovieFormPatch};
pub use controller::model_state::ModelState;
pub use controller::movies::{
    ActionResult, ControllerResult, MovieFormView, MovieGenreView, MoviesController,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::movie::{Movie, MovieChanges, MovieField, MovieFields, MovieId, RowVersion};
pub use model::validation::{validate_movie, FieldError, ValidationErrors};
pub use repo::movie_repo::{
    ConcurrencyConflict, FieldDiff, MovieListQuery, MovieRepository, NotFoundReason, RepoError,
    RepoResult, SqliteMovieRepository,
};
pub use seed::seed_if_empty;
pub use service::movie_service::MovieService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
