//! Player tag parsing and validation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors from player tag validation. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("Player tag is empty")]
    Empty,

    #[error("Invalid player tag: {0}")]
    Invalid(String),
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9A-Z]+$").expect("valid tag regex"))
}

/// A player tag in canonical `#ALPHANUMERIC` form.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerTag(String);

impl PlayerTag {
    /// Parse raw user input into a canonical tag: trims whitespace,
    /// uppercases, and prepends `#` when missing.
    pub fn parse(input: &str) -> Result<Self, TagError> {
        let mut tag = input.trim().to_uppercase();
        if tag.is_empty() || tag == "#" {
            return Err(TagError::Empty);
        }
        if !tag.starts_with('#') {
            tag.insert(0, '#');
        }

        if !tag_pattern().is_match(&tag) {
            return Err(TagError::Invalid(tag));
        }

        Ok(Self(tag))
    }

    /// Canonical form including the leading `#`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form for URL path segments (`#` becomes `%23`).
    pub fn url_encoded(&self) -> String {
        format!("%23{}", &self.0[1..])
    }
}

impl fmt::Display for PlayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PlayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerTag({})", self.0)
    }
}
