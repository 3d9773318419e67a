//! String-valued movie form and its binding into typed fields.

use crate::controller::model_state::ModelState;
use crate::model::movie::{Movie, MovieChanges, MovieField, MovieFields};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw values as posted by a create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieForm {
    pub title: String,
    pub release_date: String,
    pub genre: String,
    pub price: String,
    pub rating: String,
}

impl MovieForm {
    pub fn from_fields(fields: &MovieFields) -> Self {
        Self {
            title: fields.title.clone(),
            release_date: fields.display_value(MovieField::ReleaseDate),
            genre: fields.genre.clone(),
            price: fields.price.to_string(),
            rating: fields.rating.clone(),
        }
    }

    pub fn from_movie(movie: &Movie) -> Self {
        Self::from_fields(&movie.fields())
    }

    /// Converts the posted strings into typed fields.
    ///
    /// Unparseable dates and prices are reported into `state` and yield `None`;
    /// constraint checks are left to the store.
    pub fn bind(&self, state: &mut ModelState) -> Option<MovieFields> {
        let release_date = bind_value(
            MovieField::ReleaseDate,
            &self.release_date,
            state,
            |raw| NaiveDate::parse_from_str(raw, FORM_DATE_FORMAT).ok(),
        );
        let price = bind_value(MovieField::Price, &self.price, state, |raw| {
            Decimal::from_str(raw).ok()
        });

        Some(MovieFields {
            title: self.title.clone(),
            release_date: release_date?,
            genre: self.genre.clone(),
            price: price?,
            rating: self.rating.clone(),
        })
    }
}

/// Raw values for a partial edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFormPatch {
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub genre: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
}

impl MovieFormPatch {
    /// Converts the provided strings into a change set.
    ///
    /// Unparseable dates and prices are reported into `state` and yield `None`.
    pub fn bind(&self, state: &mut ModelState) -> Option<MovieChanges> {
        let release_date = self.release_date.as_deref().map(|raw| {
            bind_value(MovieField::ReleaseDate, raw, state, |raw| {
                NaiveDate::parse_from_str(raw, FORM_DATE_FORMAT).ok()
            })
        });
        let price = self.price.as_deref().map(|raw| {
            bind_value(MovieField::Price, raw, state, |raw| {
                Decimal::from_str(raw).ok()
            })
        });

        Some(MovieChanges {
            title: self.title.clone(),
            release_date: release_date.map_or(Some(None), |parsed| parsed.map(Some))?,
            genre: self.genre.clone(),
            price: price.map_or(Some(None), |parsed| parsed.map(Some))?,
            rating: self.rating.clone(),
        })
    }

    /// Form echoing the submitted values; absent ones render blank.
    pub fn to_form(&self) -> MovieForm {
        MovieForm {
            title: self.title.clone().unwrap_or_default(),
            release_date: self.release_date.clone().unwrap_or_default(),
            genre: self.genre.clone().unwrap_or_default(),
            price: self.price.clone().unwrap_or_default(),
            rating: self.rating.clone().unwrap_or_default(),
        }
    }
}

fn bind_value<T>(
    field: MovieField,
    raw: &str,
    state: &mut ModelState,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        state.add_error(
            field.key(),
            format!("The {} field is required.", field.display_name()),
        );
        return None;
    }

    let parsed = parse(trimmed);
    if parsed.is_none() {
        state.add_error(
            field.key(),
            format!(
                "The value '{trimmed}' is not valid for {}.",
                field.display_name()
            ),
        );
    }
    parsed
}
