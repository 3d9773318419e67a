//! Startup seeding of the sample catalogue.
//!
//! # Invariants
//! - Seeding only happens when the `movies` table is empty.
//! - The emptiness check and all inserts share one immediate transaction, so
//!   two processes starting together cannot both seed.

use crate::model::movie::MovieFields;
use crate::repo::movie_repo::{MovieRepository, RepoError, RepoResult, SqliteMovieRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;

/// Returns the fixed sample movies inserted into an empty store.
pub fn sample_movies() -> RepoResult<Vec<MovieFields>> {
    Ok(vec![
        sample("When Harry Met Sally", (1989, 2, 12), "Romantic Comedy", 799)?,
        sample("Ghostbusters ", (1984, 3, 13), "Comedy", 899)?,
        sample("Ghostbusters 2", (1986, 2, 23), "Comedy", 999)?,
        sample("Rio Bravo", (1959, 4, 15), "Western", 399)?,
    ])
}

/// Inserts the sample movies if and only if the store is empty.
///
/// Returns how many movies were inserted (`0` when the store already had data).
pub fn seed_if_empty(conn: &Connection) -> RepoResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let repo = SqliteMovieRepository::try_new(&tx)?;

    let existing = repo.count_movies()?;
    if existing > 0 {
        info!("event=seed module=seed status=skipped existing={existing}");
        return Ok(0);
    }

    let movies = sample_movies()?;
    for fields in &movies {
        repo.create_movie(fields)?;
    }
    tx.commit()?;

    info!("event=seed module=seed status=ok inserted={}", movies.len());
    Ok(movies.len())
}

fn sample(
    title: &str,
    (year, month, day): (i32, u32, u32),
    genre: &str,
    price_cents: i64,
) -> RepoResult<MovieFields> {
    let release_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid seed date {year}-{month}-{day}"))
    })?;

    Ok(MovieFields {
        title: title.to_string(),
        release_date,
        genre: genre.to_string(),
        price: Decimal::new(price_cents, 2),
        rating: "R".to_string(),
    })
}
