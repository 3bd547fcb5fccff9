//! Core data structures for announcements
//!
//! An [`Announcement`] is the immutable unit the scheduler rotates through.
//! Announcements are built from configuration at load time and replaced
//! wholesale on reload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Destination matcher that matches every destination.
pub const GLOBAL_DESTINATION: &str = "global";

/// A single announcement entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Configuration key of the entry
    pub name: String,

    /// Raw text body (legacy `&` codes or a JSON chat component)
    pub text: String,

    /// Destination matchers: literal names, `"global"`, or regex patterns
    pub destinations: BTreeSet<String>,
}

impl Announcement {
    /// Create a new announcement
    pub fn new<I, S>(name: impl Into<String>, text: impl Into<String>, destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            text: text.into(),
            destinations: destinations.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether this announcement carries the `"global"` sentinel
    pub fn is_global(&self) -> bool {
        self.destinations.contains(GLOBAL_DESTINATION)
    }

    /// Check whether the destination is listed verbatim
    pub fn lists(&self, destination: &str) -> bool {
        self.destinations.contains(destination)
    }

    /// Whether the body should be tried as a JSON chat component
    pub fn looks_like_rich_text(&self) -> bool {
        looks_like_rich_text(&self.text)
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Rich text bodies start with a JSON object or array.
pub fn looks_like_rich_text(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}
