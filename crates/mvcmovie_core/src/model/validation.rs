//! Field validation rules for movie writes.
//!
//! # Responsibility
//! - Check every client-settable field and report all failures at once.
//!
//! # Invariants
//! - Validation is pure; it never touches storage.
//! - A blank required field reports only the "required" reason.

use crate::model::movie::{MovieField, MovieFields};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 60;
pub const GENRE_MAX_CHARS: usize = 30;
pub const RATING_MAX_CHARS: usize = 5;
pub const PRICE_MAX_SCALE: u32 = 2;

pub const GENRE_PATTERN: &str = r"^[A-Z][a-zA-Z]*(?:[ -][A-Za-z]+)*$";
pub const RATING_PATTERN: &str = r#"^[A-Z]+[a-zA-Z0-9"'\s-]*$"#;

static GENRE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(GENRE_PATTERN).expect("valid genre regex"));
static RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(RATING_PATTERN).expect("valid rating regex"));

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: MovieField,
    pub message: String,
}

/// Every constraint violation found for one write attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn fields(&self) -> Vec<MovieField> {
        self.errors.iter().map(|error| error.field).collect()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {joined}")
    }
}

impl Error for ValidationErrors {}

/// Validates all movie fields.
///
/// Returns `Ok(())` or the complete list of `(field, reason)` failures.
pub fn validate_movie(fields: &MovieFields) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    check_title(&fields.title, &mut errors);
    check_patterned(
        MovieField::Genre,
        &fields.genre,
        GENRE_MAX_CHARS,
        &GENRE_RE,
        GENRE_PATTERN,
        &mut errors,
    );
    check_price(fields.price, &mut errors);
    check_patterned(
        MovieField::Rating,
        &fields.rating,
        RATING_MAX_CHARS,
        &RATING_RE,
        RATING_PATTERN,
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    if title.trim().is_empty() {
        errors.push(required(MovieField::Title));
        return;
    }

    let length = title.chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&length) {
        errors.push(FieldError {
            field: MovieField::Title,
            message: format!(
                "The field Title must be a string with a minimum length of {TITLE_MIN_CHARS} and a maximum length of {TITLE_MAX_CHARS}."
            ),
        });
    }
}

fn check_patterned(
    field: MovieField,
    value: &str,
    max_chars: usize,
    pattern: &Regex,
    pattern_text: &str,
    errors: &mut Vec<FieldError>,
) {
    if value.trim().is_empty() {
        errors.push(required(field));
        return;
    }

    if value.chars().count() > max_chars {
        errors.push(FieldError {
            field,
            message: format!(
                "The field {} must be a string with a maximum length of {max_chars}.",
                field.display_name()
            ),
        });
    }

    if !pattern.is_match(value) {
        errors.push(FieldError {
            field,
            message: format!(
                "The field {} must match the regular expression '{pattern_text}'.",
                field.display_name()
            ),
        });
    }
}

fn check_price(price: Decimal, errors: &mut Vec<FieldError>) {
    if price.is_sign_negative() && !price.is_zero() {
        errors.push(FieldError {
            field: MovieField::Price,
            message: "The field Price must not be negative.".to_string(),
        });
    }

    // Trailing zeros do not count toward the scale.
    if price.normalize().scale() > PRICE_MAX_SCALE {
        errors.push(FieldError {
            field: MovieField::Price,
            message: format!(
                "The field Price must have at most {PRICE_MAX_SCALE} decimal places."
            ),
        });
    }
}

fn required(field: MovieField) -> FieldError {
    FieldError {
        field,
        message: format!("The {} field is required.", field.display_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_movie, GENRE_RE, RATING_RE};
    use crate::model::movie::{MovieField, MovieFields};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn priced(price: Decimal) -> MovieFields {
        MovieFields {
            title: "Rio Bravo".to_string(),
            release_date: NaiveDate::from_ymd_opt(1959, 4, 15).unwrap(),
            genre: "Western".to_string(),
            price,
            rating: "R".to_string(),
        }
    }

    #[test]
    fn genre_pattern_accepts_multi_word_genres() {
        for genre in ["Comedy", "Romantic Comedy", "Sci-Fi", "Western"] {
            assert!(GENRE_RE.is_match(genre), "{genre} should match");
        }
        for genre in ["sci-fi", "Comedy 2", "Drama  Noir", "Sci-", " Comedy"] {
            assert!(!GENRE_RE.is_match(genre), "{genre} should not match");
        }
    }

    #[test]
    fn rating_pattern_allows_digits_and_hyphen_after_first_letter() {
        assert!(RATING_RE.is_match("PG-13"));
        assert!(RATING_RE.is_match("R"));
        assert!(!RATING_RE.is_match("13"));
        assert!(!RATING_RE.is_match("pg"));
    }

    #[test]
    fn price_allows_at_most_cents() {
        assert!(validate_movie(&priced(Decimal::new(899, 2))).is_ok());
        assert!(validate_movie(&priced(Decimal::new(89, 1))).is_ok());
        assert!(validate_movie(&priced(Decimal::new(8990, 3))).is_ok());

        let errors = validate_movie(&priced(Decimal::new(8999, 3))).unwrap_err();
        assert_eq!(errors.fields(), vec![MovieField::Price]);
        assert_eq!(
            errors.errors()[0].message,
            "The field Price must have at most 2 decimal places."
        );
    }
}
