//! Request-forgery token check for mutating actions.
//!
//! # Invariants
//! - A session issues one random token and every create/edit/delete request
//!   must echo it back.
//! - Token comparison does not short-circuit on the first differing byte.

use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntiForgeryError {
    MissingToken,
    TokenMismatch,
}

impl Display for AntiForgeryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "anti-forgery token is missing"),
            Self::TokenMismatch => write!(f, "anti-forgery token does not match the session"),
        }
    }
}

impl Error for AntiForgeryError {}

/// Session-scoped anti-forgery token.
#[derive(Debug, Clone)]
pub struct AntiForgery {
    token: String,
}

impl AntiForgery {
    /// Starts a session with a fresh random token.
    pub fn new_session() -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Restores a session whose token was issued earlier.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Token to embed in forms rendered for this session.
    pub fn request_token(&self) -> &str {
        &self.token
    }

    pub fn verify(&self, submitted: Option<&str>) -> Result<(), AntiForgeryError> {
        let Some(submitted) = submitted.filter(|value| !value.is_empty()) else {
            warn!("event=antiforgery_check module=controller status=error reason=missing");
            return Err(AntiForgeryError::MissingToken);
        };

        if !constant_time_eq(self.token.as_bytes(), submitted.as_bytes()) {
            warn!("event=antiforgery_check module=controller status=error reason=mismatch");
            return Err(AntiForgeryError::TokenMismatch);
        }

        Ok(())
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::{AntiForgery, AntiForgeryError};

    #[test]
    fn verify_accepts_only_the_session_token() {
        let session = AntiForgery::new_session();
        let token = session.request_token().to_string();

        assert!(session.verify(Some(&token)).is_ok());
        assert_eq!(session.verify(None), Err(AntiForgeryError::MissingToken));
        assert_eq!(session.verify(Some("")), Err(AntiForgeryError::MissingToken));
        assert_eq!(
            session.verify(Some("forged")),
            Err(AntiForgeryError::TokenMismatch)
        );
    }

    #[test]
    fn sessions_issue_distinct_tokens() {
        let first = AntiForgery::new_session();
        let second = AntiForgery::new_session();
        assert_ne!(first.request_token(), second.request_token());
        assert!(AntiForgery::with_token(first.request_token())
            .verify(Some(first.request_token()))
            .is_ok());
    }
}
