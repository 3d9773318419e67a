//! Movie record store use-case service.
//!
//! # Responsibility
//! - Provide the record-store entry points (create, get, list, genres,
//!   concurrency-checked update, delete) for request-layer callers.
//! - Turn absent reads into semantic `NotFound` errors.
//! - Emit metadata-only diagnostic events for every write outcome.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Conflicts are surfaced to the caller, never retried or merged here.

use crate::model::movie::{Movie, MovieChanges, MovieFields, MovieId, RowVersion};
use crate::repo::movie_repo::{MovieListQuery, MovieRepository, RepoError, RepoResult};
use log::{debug, info, warn};

/// Record store over a movie repository implementation.
pub struct MovieService<R: MovieRepository> {
    repo: R,
}

impl<R: MovieRepository> MovieService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and persists a new movie.
    pub fn create(&self, fields: &MovieFields) -> RepoResult<Movie> {
        match self.repo.create_movie(fields) {
            Ok(movie) => {
                info!(
                    "event=movie_create module=service status=ok id={} version={}",
                    movie.id, movie.version
                );
                Ok(movie)
            }
            Err(err) => {
                log_write_failure("movie_create", None, &err);
                Err(err)
            }
        }
    }

    /// Gets one movie or `NotFound`.
    pub fn get(&self, id: MovieId) -> RepoResult<Movie> {
        match self.repo.get_movie(id)? {
            Some(movie) => Ok(movie),
            None => Err(RepoError::NotFound {
                id,
                reason: self.repo.not_found_reason(id)?,
            }),
        }
    }

    /// Lists movies matching the optional genre/title filters.
    pub fn list(&self, query: &MovieListQuery) -> RepoResult<Vec<Movie>> {
        let movies = self.repo.list_movies(query)?;
        debug!(
            "event=movie_list module=service status=ok genre_filter={} title_filter={} count={}",
            query.genre.is_some(),
            query.title_contains.is_some(),
            movies.len()
        );
        Ok(movies)
    }

    /// Sorted distinct genres, read live from storage.
    pub fn distinct_genres(&self) -> RepoResult<Vec<String>> {
        self.repo.list_genres()
    }

    /// Applies `changes` if `expected_version` is still current.
    ///
    /// # Errors
    /// - `NotFound` when the movie is gone (`DeletedByAnotherUser` unless the
    ///   id was never issued).
    /// - `ConcurrencyConflict` when another writer got there first.
    /// - `Validation` when the resulting record breaks a field constraint.
    pub fn update(
        &self,
        id: MovieId,
        expected_version: RowVersion,
        changes: &MovieChanges,
    ) -> RepoResult<Movie> {
        match self.repo.update_movie(id, expected_version, changes) {
            Ok(movie) => {
                info!(
                    "event=movie_update module=service status=ok id={id} from_version={expected_version} to_version={}",
                    movie.version
                );
                Ok(movie)
            }
            Err(err) => {
                log_write_failure("movie_update", Some(id), &err);
                Err(err)
            }
        }
    }

    /// Removes a movie. Returns whether a record was actually removed.
    pub fn delete(&self, id: MovieId) -> RepoResult<bool> {
        let removed = self.repo.delete_movie(id)?;
        info!("event=movie_delete module=service status=ok id={id} removed={removed}");
        Ok(removed)
    }
}

fn log_write_failure(event: &str, id: Option<MovieId>, err: &RepoError) {
    let id = id.map_or_else(|| "-".to_string(), |value| value.to_string());
    match err {
        RepoError::Validation(errors) => info!(
            "event={event} module=service status=invalid id={id} fields={:?}",
            errors.fields()
        ),
        RepoError::ConcurrencyConflict(conflict) => warn!(
            "event={event} module=service status=conflict id={id} current_version={} diff_count={}",
            conflict.current_version(),
            conflict.diffs.len()
        ),
        RepoError::NotFound { reason, .. } => warn!(
            "event={event} module=service status=not_found id={id} reason={reason:?}"
        ),
        other => warn!("event={event} module=service status=error id={id} error={other}"),
    }
}
