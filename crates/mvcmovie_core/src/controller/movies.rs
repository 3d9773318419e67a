//! Movie request handlers.
//!
//! # Responsibility
//! - Map list/details/create/edit/delete requests onto `MovieService`.
//! - Short-circuit missing ids and forged requests before touching the store.
//! - Translate store outcomes into views carrying `ModelState` messages.
//!
//! # Invariants
//! - Every mutating action verifies the anti-forgery token first.
//! - Only infrastructure failures escape as `Err`; not-found, validation and
//!   conflict outcomes are always `ActionResult` values.

use crate::controller::antiforgery::AntiForgery;
use crate::controller::form::{MovieForm, MovieFormPatch};
use crate::controller::model_state::ModelState;
use crate::model::movie::{Movie, MovieChanges, MovieId, RowVersion};
use crate::repo::movie_repo::{
    MovieListQuery, MovieRepository, NotFoundReason, RepoError, RepoResult,
};
use crate::service::movie_service::MovieService;
use serde::Serialize;

pub const DELETED_BY_ANOTHER_USER_MESSAGE: &str =
    "Unable to save changes. The movie was deleted by another user.";

pub const CONCURRENCY_CONFLICT_MESSAGE: &str = "The record you attempted to edit was modified by \
another user after you got the original value. The edit operation was canceled and the current \
values in the database have been displayed. If you still want to edit this record, click the Save \
button again. Otherwise click the Back to List hyperlink.";

pub const INVALID_VERSION_MESSAGE: &str =
    "The record version is missing or invalid. Reload the movie and edit it again.";

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionResult<V> {
    View(V),
    NotFound,
    RedirectToIndex,
    BadRequest(String),
}

impl<V> ActionResult<V> {
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> ActionResult<U> {
        match self {
            Self::View(view) => ActionResult::View(f(view)),
            Self::NotFound => ActionResult::NotFound,
            Self::RedirectToIndex => ActionResult::RedirectToIndex,
            Self::BadRequest(message) => ActionResult::BadRequest(message),
        }
    }

    pub fn into_view(self) -> Option<V> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }
}

pub type ControllerResult<V> = RepoResult<ActionResult<V>>;

/// Index page model: filtered movies plus the genre dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieGenreView {
    pub movies: Vec<Movie>,
    pub genres: Vec<String>,
    pub movie_genre: Option<String>,
    pub search_string: Option<String>,
}

/// Create/edit page model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFormView {
    pub id: Option<MovieId>,
    pub form: MovieForm,
    /// Version token to post back with the next save.
    pub row_version: Option<String>,
    pub request_token: String,
    pub model_state: ModelState,
}

/// Handlers for the movie pages, scoped to one session.
pub struct MoviesController<R: MovieRepository> {
    service: MovieService<R>,
    antiforgery: AntiForgery,
}

impl<R: MovieRepository> MoviesController<R> {
    pub fn new(service: MovieService<R>, antiforgery: AntiForgery) -> Self {
        Self {
            service,
            antiforgery,
        }
    }

    pub fn request_token(&self) -> &str {
        self.antiforgery.request_token()
    }

    /// Lists movies, optionally narrowed by genre and title search text.
    pub fn index(
        &self,
        movie_genre: Option<&str>,
        search_string: Option<&str>,
    ) -> ControllerResult<MovieGenreView> {
        let movie_genre = non_blank(movie_genre);
        let search_string = non_blank(search_string);
        let query = MovieListQuery {
            genre: movie_genre.clone(),
            title_contains: search_string.clone(),
        };

        Ok(ActionResult::View(MovieGenreView {
            movies: self.service.list(&query)?,
            genres: self.service.distinct_genres()?,
            movie_genre,
            search_string,
        }))
    }

    pub fn details(&self, id: Option<MovieId>) -> ControllerResult<Movie> {
        self.find(id)
    }

    pub fn create_form(&self) -> ActionResult<MovieFormView> {
        ActionResult::View(self.form_view(
            None,
            MovieForm::default(),
            None,
            ModelState::default(),
        ))
    }

    pub fn create(
        &self,
        request_token: Option<&str>,
        form: MovieForm,
    ) -> ControllerResult<MovieFormView> {
        if let Err(err) = self.antiforgery.verify(request_token) {
            return Ok(ActionResult::BadRequest(err.to_string()));
        }

        let mut state = ModelState::default();
        let Some(fields) = form.bind(&mut state) else {
            return Ok(ActionResult::View(self.form_view(None, form, None, state)));
        };

        match self.service.create(&fields) {
            Ok(_) => Ok(ActionResult::RedirectToIndex),
            Err(RepoError::Validation(errors)) => {
                state.add_validation_errors(&errors);
                Ok(ActionResult::View(self.form_view(None, form, None, state)))
            }
            Err(err) => Err(err),
        }
    }

    pub fn edit_form(&self, id: Option<MovieId>) -> ControllerResult<MovieFormView> {
        Ok(self.find(id)?.map(|movie| {
            self.form_view(
                Some(movie.id),
                MovieForm::from_movie(&movie),
                Some(movie.version),
                ModelState::default(),
            )
        }))
    }

    /// Saves an edit made against the version the user originally loaded.
    pub fn edit(
        &self,
        request_token: Option<&str>,
        id: Option<MovieId>,
        row_version: &str,
        form: MovieForm,
    ) -> ControllerResult<MovieFormView> {
        if let Err(err) = self.antiforgery.verify(request_token) {
            return Ok(ActionResult::BadRequest(err.to_string()));
        }
        let Some(id) = id else {
            return Ok(ActionResult::NotFound);
        };

        let mut state = ModelState::default();
        let Ok(expected_version) = row_version.parse::<RowVersion>() else {
            state.add_form_error(INVALID_VERSION_MESSAGE);
            return Ok(ActionResult::View(self.form_view(Some(id), form, None, state)));
        };
        let Some(fields) = form.bind(&mut state) else {
            return Ok(ActionResult::View(self.form_view(
                Some(id),
                form,
                Some(expected_version),
                state,
            )));
        };

        let changes = MovieChanges::replace_all(fields);
        self.save_edit(id, expected_version, &changes, form, state)
    }

    /// Saves only the provided values, against the version the caller last saw.
    ///
    /// Outcomes match `edit`; the record does not have to be loaded first.
    pub fn edit_patch(
        &self,
        request_token: Option<&str>,
        id: Option<MovieId>,
        row_version: &str,
        patch: &MovieFormPatch,
    ) -> ControllerResult<MovieFormView> {
        if let Err(err) = self.antiforgery.verify(request_token) {
            return Ok(ActionResult::BadRequest(err.to_string()));
        }
        let Some(id) = id else {
            return Ok(ActionResult::NotFound);
        };

        let mut state = ModelState::default();
        let Ok(expected_version) = row_version.parse::<RowVersion>() else {
            state.add_form_error(INVALID_VERSION_MESSAGE);
            return Ok(ActionResult::View(self.form_view(
                Some(id),
                patch.to_form(),
                None,
                state,
            )));
        };
        let Some(changes) = patch.bind(&mut state) else {
            return Ok(ActionResult::View(self.form_view(
                Some(id),
                patch.to_form(),
                Some(expected_version),
                state,
            )));
        };

        self.save_edit(id, expected_version, &changes, patch.to_form(), state)
    }

    fn save_edit(
        &self,
        id: MovieId,
        expected_version: RowVersion,
        changes: &MovieChanges,
        form: MovieForm,
        mut state: ModelState,
    ) -> ControllerResult<MovieFormView> {
        match self.service.update(id, expected_version, changes) {
            Ok(_) => Ok(ActionResult::RedirectToIndex),
            Err(RepoError::NotFound {
                reason: NotFoundReason::NeverExisted,
                ..
            }) => Ok(ActionResult::NotFound),
            Err(RepoError::NotFound {
                reason: NotFoundReason::DeletedByAnotherUser,
                ..
            }) => {
                state.add_form_error(DELETED_BY_ANOTHER_USER_MESSAGE);
                Ok(ActionResult::View(self.form_view(None, form, None, state)))
            }
            Err(RepoError::Validation(errors)) => {
                state.add_validation_errors(&errors);
                Ok(ActionResult::View(self.form_view(
                    Some(id),
                    form,
                    Some(expected_version),
                    state,
                )))
            }
            Err(RepoError::ConcurrencyConflict(conflict)) => {
                for diff in &conflict.diffs {
                    state.add_error(diff.field.key(), diff.message.clone());
                }
                state.add_form_error(CONCURRENCY_CONFLICT_MESSAGE);
                Ok(ActionResult::View(self.form_view(
                    Some(id),
                    MovieForm::from_fields(&conflict.submitted),
                    Some(conflict.current_version()),
                    state,
                )))
            }
            Err(err) => Err(err),
        }
    }

    /// First step of the two-step delete: show what would be removed.
    pub fn delete_form(&self, id: Option<MovieId>) -> ControllerResult<Movie> {
        self.find(id)
    }

    /// Second step of the two-step delete. Succeeds when the movie is already gone.
    pub fn delete_confirmed(
        &self,
        request_token: Option<&str>,
        id: MovieId,
    ) -> ControllerResult<()> {
        if let Err(err) = self.antiforgery.verify(request_token) {
            return Ok(ActionResult::BadRequest(err.to_string()));
        }

        self.service.delete(id)?;
        Ok(ActionResult::RedirectToIndex)
    }

    fn find(&self, id: Option<MovieId>) -> ControllerResult<Movie> {
        let Some(id) = id else {
            return Ok(ActionResult::NotFound);
        };

        match self.service.get(id) {
            Ok(movie) => Ok(ActionResult::View(movie)),
            Err(RepoError::NotFound { .. }) => Ok(ActionResult::NotFound),
            Err(err) => Err(err),
        }
    }

    fn form_view(
        &self,
        id: Option<MovieId>,
        form: MovieForm,
        row_version: Option<RowVersion>,
        model_state: ModelState,
    ) -> MovieFormView {
        MovieFormView {
            id,
            form,
            row_version: row_version.map(|version| version.to_string()),
            request_token: self.antiforgery.request_token().to_string(),
            model_state,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
