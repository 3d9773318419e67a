//! Movie domain model.
//!
//! # Responsibility
//! - Define the canonical movie record and the input shapes used to write it.
//! - Own the opaque row-version token used for optimistic concurrency.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused for another movie.
//! - `version` changes on every successful write; callers only compare it.
//! - `MovieChanges` cannot express `id` or `version`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned movie identifier.
pub type MovieId = i64;

/// Opaque optimistic-concurrency token.
///
/// Carried through forms as its string form and compared for equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowVersion(i64);

impl RowVersion {
    pub(crate) const INITIAL: RowVersion = RowVersion(1);

    pub(crate) fn from_db(value: i64) -> Self {
        Self(value)
    }

    pub(crate) fn to_db(self) -> i64 {
        self.0
    }
}

impl Display for RowVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a submitted version token cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowVersionParseError(pub String);

impl Display for RowVersionParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid row version token `{}`", self.0)
    }
}

impl Error for RowVersionParseError {}

impl FromStr for RowVersion {
    type Err = RowVersionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| RowVersionParseError(value.to_string()))
    }
}

/// Client-settable movie fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFields {
    pub title: String,
    pub release_date: NaiveDate,
    pub genre: String,
    pub price: Decimal,
    pub rating: String,
}

/// Partial update. `None` keeps the persisted value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub price: Option<Decimal>,
    pub rating: Option<String>,
}

impl MovieChanges {
    /// Builds a change set that overwrites every client-settable field.
    pub fn replace_all(fields: MovieFields) -> Self {
        Self {
            title: Some(fields.title),
            release_date: Some(fields.release_date),
            genre: Some(fields.genre),
            price: Some(fields.price),
            rating: Some(fields.rating),
        }
    }
}

/// Persisted movie record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub release_date: NaiveDate,
    pub genre: String,
    pub price: Decimal,
    pub rating: String,
    pub version: RowVersion,
}

impl Movie {
    /// Returns the client-settable part of this record.
    pub fn fields(&self) -> MovieFields {
        MovieFields {
            title: self.title.clone(),
            release_date: self.release_date,
            genre: self.genre.clone(),
            price: self.price,
            rating: self.rating.clone(),
        }
    }

    /// Returns the field values that result from applying `changes` on top of
    /// this record. Nothing is validated here.
    pub fn apply(&self, changes: &MovieChanges) -> MovieFields {
        MovieFields {
            title: changes.title.clone().unwrap_or_else(|| self.title.clone()),
            release_date: changes.release_date.unwrap_or(self.release_date),
            genre: changes.genre.clone().unwrap_or_else(|| self.genre.clone()),
            price: changes.price.unwrap_or(self.price),
            rating: changes.rating.clone().unwrap_or_else(|| self.rating.clone()),
        }
    }
}

/// Client-settable field names, used to key validation and conflict messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MovieField {
    Title,
    ReleaseDate,
    Genre,
    Price,
    Rating,
}

impl MovieField {
    pub const ALL: [MovieField; 5] = [
        MovieField::Title,
        MovieField::ReleaseDate,
        MovieField::Genre,
        MovieField::Price,
        MovieField::Rating,
    ];

    /// Property-style key (`ReleaseDate`).
    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::ReleaseDate => "ReleaseDate",
            Self::Genre => "Genre",
            Self::Price => "Price",
            Self::Rating => "Rating",
        }
    }

    /// Human label (`Release Date`).
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ReleaseDate => "Release Date",
            other => other.key(),
        }
    }
}

impl Display for MovieField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl MovieFields {
    /// Renders one field the way it is shown back to a user.
    pub fn display_value(&self, field: MovieField) -> String {
        match field {
            MovieField::Title => self.title.clone(),
            MovieField::ReleaseDate => self.release_date.format("%Y-%m-%d").to_string(),
            MovieField::Genre => self.genre.clone(),
            MovieField::Price => format!("{:.2}", self.price),
            MovieField::Rating => self.rating.clone(),
        }
    }

    /// Fields whose values differ between `self` and `other`, in declaration order.
    pub fn differing_fields(&self, other: &MovieFields) -> Vec<MovieField> {
        MovieField::ALL
            .into_iter()
            .filter(|field| match field {
                MovieField::Title => self.title != other.title,
                MovieField::ReleaseDate => self.release_date != other.release_date,
                MovieField::Genre => self.genre != other.genre,
                MovieField::Price => self.price != other.price,
                MovieField::Rating => self.rating != other.rating,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Movie, MovieChanges, MovieField, RowVersion};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn sample() -> Movie {
        Movie {
            id: 7,
            title: "Rio Bravo".to_string(),
            release_date: NaiveDate::from_ymd_opt(1959, 4, 15).unwrap(),
            genre: "Western".to_string(),
            price: Decimal::new(399, 2),
            rating: "R".to_string(),
            version: RowVersion::INITIAL,
        }
    }

    #[test]
    fn apply_keeps_untouched_fields() {
        let movie = sample();
        let changes = MovieChanges {
            price: Some(Decimal::new(499, 2)),
            ..MovieChanges::default()
        };

        let applied = movie.apply(&changes);
        assert_eq!(applied.title, "Rio Bravo");
        assert_eq!(applied.price, Decimal::new(499, 2));
        assert_eq!(movie.fields().differing_fields(&applied), vec![MovieField::Price]);
    }

    #[test]
    fn row_version_token_parses_its_display_form() {
        let token = RowVersion::from_db(42).to_string();
        assert_eq!(token.parse::<RowVersion>().unwrap(), RowVersion::from_db(42));
        assert!("AAAA".parse::<RowVersion>().is_err());
    }

    #[test]
    fn price_display_uses_two_decimals() {
        let mut fields = sample().fields();
        fields.price = Decimal::new(8, 0);
        assert_eq!(fields.display_value(MovieField::Price), "8.00");
        assert_eq!(fields.display_value(MovieField::ReleaseDate), "1959-04-15");
    }
}
