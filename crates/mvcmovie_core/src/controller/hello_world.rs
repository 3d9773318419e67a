//! Greeting pages used as a routing smoke check.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeView {
    pub message: String,
    pub num_times: u32,
}

/// Static landing text.
pub fn index() -> &'static str {
    "This is my default action..."
}

/// Greets `name`, repeated `num_times` (default 1) by the presentation layer.
pub fn welcome(name: &str, num_times: Option<u32>) -> WelcomeView {
    WelcomeView {
        message: format!("Hello {name}"),
        num_times: num_times.unwrap_or(1),
    }
}
