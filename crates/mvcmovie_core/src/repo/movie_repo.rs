//! Movie repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over canonical `movies` storage.
//! - Implement the concurrency-checked update protocol against `row_version`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `validate_movie()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - The version check and the write of one update run inside a single
//!   `BEGIN IMMEDIATE` transaction, and the `UPDATE` is guarded by the
//!   expected `row_version`.
//! - Ids come from `AUTOINCREMENT` and are never reused.

use crate::db::migrations::{find_schema_gap, SchemaGap};
use crate::db::DbError;
use crate::model::movie::{Movie, MovieChanges, MovieField, MovieFields, MovieId, RowVersion};
use crate::model::validation::{validate_movie, ValidationErrors};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MOVIE_SELECT_SQL: &str = "SELECT
    id,
    title,
    release_date,
    genre,
    price,
    rating,
    row_version
FROM movies";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Why an id did not resolve to a live movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotFoundReason {
    /// The id was never issued by this store.
    NeverExisted,
    /// The id was issued and the movie has since been removed. Also the
    /// answer whenever the store cannot tell the two cases apart.
    DeletedByAnotherUser,
}

/// One field where the caller's values differ from the persisted ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub field: MovieField,
    /// `Current value: <value>`.
    pub message: String,
}

/// Details of a rejected update whose expected version was stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcurrencyConflict {
    /// Values the caller tried to save.
    pub submitted: MovieFields,
    /// Record as currently persisted, including its current version.
    pub current: Movie,
    pub diffs: Vec<FieldDiff>,
}

impl ConcurrencyConflict {
    pub fn new(submitted: MovieFields, current: Movie) -> Self {
        let current_fields = current.fields();
        let diffs = submitted
            .differing_fields(&current_fields)
            .into_iter()
            .map(|field| FieldDiff {
                field,
                message: format!("Current value: {}", current_fields.display_value(field)),
            })
            .collect();

        Self {
            submitted,
            current,
            diffs,
        }
    }

    /// Version a retry must present.
    pub fn current_version(&self) -> RowVersion {
        self.current.version
    }
}

/// Repository error for movie persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationErrors),
    ConcurrencyConflict(Box<ConcurrencyConflict>),
    NotFound {
        id: MovieId,
        reason: NotFoundReason,
    },
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ConcurrencyConflict(conflict) => write!(
                f,
                "movie {} was modified by another user (current version {})",
                conflict.current.id, conflict.current.version
            ),
            Self::NotFound {
                id,
                reason: NotFoundReason::NeverExisted,
            } => write!(f, "movie not found: {id}"),
            Self::NotFound {
                id,
                reason: NotFoundReason::DeletedByAnotherUser,
            } => write!(f, "movie {id} was deleted by another user"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted movie data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}; open it with open_db()"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::ConcurrencyConflict(_)
            | Self::NotFound { .. }
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filters for listing movies. Blank values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieListQuery {
    /// Exact genre match.
    pub genre: Option<String>,
    /// Title substring, compared case-insensitively on every character.
    pub title_contains: Option<String>,
}

/// Repository interface for movie records.
pub trait MovieRepository {
    fn create_movie(&self, fields: &MovieFields) -> RepoResult<Movie>;
    fn get_movie(&self, id: MovieId) -> RepoResult<Option<Movie>>;
    fn list_movies(&self, query: &MovieListQuery) -> RepoResult<Vec<Movie>>;
    /// Distinct genres currently stored, sorted ascending.
    fn list_genres(&self) -> RepoResult<Vec<String>>;
    /// Concurrency-checked partial update.
    fn update_movie(
        &self,
        id: MovieId,
        expected_version: RowVersion,
        changes: &MovieChanges,
    ) -> RepoResult<Movie>;
    /// Removes a movie. Returns `false` when it was already gone.
    fn delete_movie(&self, id: MovieId) -> RepoResult<bool>;
    fn count_movies(&self) -> RepoResult<u64>;
    /// Classifies an id that did not resolve to a live movie.
    fn not_found_reason(&self, id: MovieId) -> RepoResult<NotFoundReason>;
}

/// SQLite-backed movie repository.
pub struct SqliteMovieRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMovieRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is behind.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the `movies`
    ///   table does not have the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MovieRepository for SqliteMovieRepository<'_> {
    fn create_movie(&self, fields: &MovieFields) -> RepoResult<Movie> {
        validate_movie(fields)?;

        self.conn.execute(
            "INSERT INTO movies (
                title,
                release_date,
                genre,
                price,
                rating,
                row_version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                fields.title.as_str(),
                date_to_db(fields.release_date),
                fields.genre.as_str(),
                fields.price.to_string(),
                fields.rating.as_str(),
                RowVersion::INITIAL.to_db(),
            ],
        )?;

        Ok(Movie {
            id: self.conn.last_insert_rowid(),
            title: fields.title.clone(),
            release_date: fields.release_date,
            genre: fields.genre.clone(),
            price: fields.price,
            rating: fields.rating.clone(),
            version: RowVersion::INITIAL,
        })
    }

    fn get_movie(&self, id: MovieId) -> RepoResult<Option<Movie>> {
        select_movie(self.conn, id)
    }

    fn list_movies(&self, query: &MovieListQuery) -> RepoResult<Vec<Movie>> {
        let mut sql = format!("{MOVIE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(genre) = non_blank(query.genre.as_deref()) {
            sql.push_str(" AND genre = ?");
            bind_values.push(Value::Text(genre.to_string()));
        }

        sql.push_str(" ORDER BY id ASC");

        // SQLite only folds ASCII case, so the title filter runs here.
        let needle = non_blank(query.title_contains.as_deref()).map(str::to_lowercase);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut movies = Vec::new();

        while let Some(row) = rows.next()? {
            let movie = parse_movie_row(row)?;
            if needle
                .as_deref()
                .map_or(true, |text| title_contains(&movie.title, text))
            {
                movies.push(movie);
            }
        }

        Ok(movies)
    }

    fn list_genres(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT genre FROM movies ORDER BY genre ASC;")?;
        let genres = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    fn update_movie(
        &self,
        id: MovieId,
        expected_version: RowVersion,
        changes: &MovieChanges,
    ) -> RepoResult<Movie> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let Some(current) = select_movie(&tx, id)? else {
            let reason = classify_missing(&tx, id)?;
            return Err(RepoError::NotFound { id, reason });
        };

        let submitted = current.apply(changes);
        if current.version != expected_version {
            return Err(RepoError::ConcurrencyConflict(Box::new(
                ConcurrencyConflict::new(submitted, current),
            )));
        }

        validate_movie(&submitted)?;

        let changed = tx.execute(
            "UPDATE movies
             SET
                title = ?1,
                release_date = ?2,
                genre = ?3,
                price = ?4,
                rating = ?5,
                row_version = row_version + 1
             WHERE id = ?6
               AND row_version = ?7;",
            params![
                submitted.title.as_str(),
                date_to_db(submitted.release_date),
                submitted.genre.as_str(),
                submitted.price.to_string(),
                submitted.rating.as_str(),
                id,
                expected_version.to_db(),
            ],
        )?;

        if changed == 0 {
            return Err(stale_write_error(&tx, id, submitted)?);
        }

        let updated = select_movie(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("movie {id} vanished inside its own update"))
        })?;
        tx.commit()?;

        Ok(updated)
    }

    fn delete_movie(&self, id: MovieId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM movies WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn count_movies(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM movies;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative movie count `{count}`")))
    }

    fn not_found_reason(&self, id: MovieId) -> RepoResult<NotFoundReason> {
        classify_missing(self.conn, id)
    }
}

fn select_movie(conn: &Connection, id: MovieId) -> RepoResult<Option<Movie>> {
    let mut stmt = conn.prepare(&format!("{MOVIE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_movie_row(row)?));
    }

    Ok(None)
}

/// Ids above the `AUTOINCREMENT` high-water mark were never issued; anything
/// else that is missing has been deleted.
fn classify_missing(conn: &Connection, id: MovieId) -> RepoResult<NotFoundReason> {
    let highest_issued: i64 = conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name = 'movies';",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);

    if id <= 0 || id > highest_issued {
        Ok(NotFoundReason::NeverExisted)
    } else {
        Ok(NotFoundReason::DeletedByAnotherUser)
    }
}

/// Explains a guarded `UPDATE` that matched no row.
fn stale_write_error(
    conn: &Connection,
    id: MovieId,
    submitted: MovieFields,
) -> RepoResult<RepoError> {
    match select_movie(conn, id)? {
        Some(current) => Ok(RepoError::ConcurrencyConflict(Box::new(
            ConcurrencyConflict::new(submitted, current),
        ))),
        None => Ok(RepoError::NotFound {
            id,
            reason: classify_missing(conn, id)?,
        }),
    }
}

fn parse_movie_row(row: &Row<'_>) -> RepoResult<Movie> {
    let id: MovieId = row.get("id")?;

    let date_text: String = row.get("release_date")?;
    let release_date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid release date `{date_text}` in movies.release_date for id {id}"
        ))
    })?;

    let price_text: String = row.get("price")?;
    let price = Decimal::from_str(&price_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid price `{price_text}` in movies.price for id {id}"
        ))
    })?;

    let movie = Movie {
        id,
        title: row.get("title")?,
        release_date,
        genre: row.get("genre")?,
        price,
        rating: row.get("rating")?,
        version: RowVersion::from_db(row.get("row_version")?),
    };

    validate_movie(&movie.fields())
        .map_err(|err| RepoError::InvalidData(format!("movie {id}: {err}")))?;
    Ok(movie)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    match find_schema_gap(conn)? {
        None => Ok(()),
        Some(SchemaGap::Behind { expected, actual }) => Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        }),
        Some(SchemaGap::MissingTable(table)) => Err(RepoError::MissingRequiredTable(table)),
        Some(SchemaGap::MissingColumn { table, column }) => {
            Err(RepoError::MissingRequiredColumn { table, column })
        }
    }
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Case-insensitive substring match; `needle` must already be lowercase.
fn title_contains(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::title_contains;

    #[test]
    fn title_match_folds_case_beyond_ascii() {
        for search in ["amélie", "AMéLIE", "AMÉLIE", "Amélie"] {
            assert!(
                title_contains("Amélie", &search.to_lowercase()),
                "{search} should match"
            );
        }
        assert!(title_contains("100% Wolf", "%"));
        assert!(!title_contains("Heat", "_"));
    }
}
