//! Field-keyed error messages handed to the presentation layer.

use crate::model::validation::ValidationErrors;
use serde::Serialize;
use std::collections::BTreeMap;

/// Messages keyed by field name; the empty key holds form-level messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelState {
    entries: BTreeMap<String, Vec<String>>,
}

impl ModelState {
    pub const FORM_KEY: &'static str = "";

    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_form_error(&mut self, message: impl Into<String>) {
        self.add_error(Self::FORM_KEY, message);
    }

    pub fn add_validation_errors(&mut self, errors: &ValidationErrors) {
        for error in errors.errors() {
            self.add_error(error.field.key(), error.message.clone());
        }
    }

    pub fn is_valid(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn errors_for(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn form_errors(&self) -> &[String] {
        self.errors_for(Self::FORM_KEY)
    }

    /// Iterates `(key, messages)` in key order, form-level first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, messages)| (key.as_str(), messages.as_slice()))
    }
}
