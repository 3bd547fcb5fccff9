//! Destination matching
//!
//! An announcement matches a destination when the destination is listed
//! verbatim, when the announcement carries the `"global"` sentinel, or when
//! any of its matchers, read as a regular expression, finds a match anywhere
//! in the destination name.
//!
//! Patterns are compiled once per configuration load. Entries that fail to
//! compile are kept in the cache as invalid and never match.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;

use crate::models::Announcement;

/// A matcher that failed to compile at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternWarning {
    /// Announcement the matcher belongs to
    pub announcement: String,
    /// Raw matcher text
    pub pattern: String,
    /// Compiler message
    pub reason: String,
}

impl fmt::Display for PatternWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "announcement '{}': destination pattern '{}' never matches ({})",
            self.announcement, self.pattern, self.reason
        )
    }
}

/// Precompiled destination patterns keyed by their raw text
#[derive(Debug, Clone, Default)]
pub struct PatternCache {
    patterns: HashMap<String, Option<Regex>>,
}

impl PatternCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every matcher of the given announcements
    ///
    /// Returns the cache together with one warning per matcher that failed
    /// to compile. A pattern shared by several announcements is compiled once
    /// but reported for each announcement using it.
    pub fn build<'a, I>(announcements: I) -> (Self, Vec<PatternWarning>)
    where
        I: IntoIterator<Item = &'a Announcement>,
    {
        let mut cache = Self::new();
        let mut failures: HashMap<String, String> = HashMap::new();
        let mut warnings = Vec::new();

        for announcement in announcements {
            for pattern in &announcement.destinations {
                if !cache.patterns.contains_key(pattern) {
                    match Regex::new(pattern) {
                        Ok(regex) => {
                            cache.patterns.insert(pattern.clone(), Some(regex));
                        }
                        Err(e) => {
                            cache.patterns.insert(pattern.clone(), None);
                            failures.insert(pattern.clone(), e.to_string());
                        }
                    }
                }

                if let Some(reason) = failures.get(pattern) {
                    tracing::warn!(
                        announcement = %announcement.name,
                        pattern = %pattern,
                        "Destination pattern failed to compile, entry will never match"
                    );
                    warnings.push(PatternWarning {
                        announcement: announcement.name.clone(),
                        pattern: pattern.clone(),
                        reason: reason.clone(),
                    });
                }
            }
        }

        (cache, warnings)
    }

    /// Number of distinct patterns held
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of patterns that failed to compile
    pub fn invalid_count(&self) -> usize {
        self.patterns.values().filter(|p| p.is_none()).count()
    }

    /// Test a raw pattern against a destination
    ///
    /// Unknown or invalid patterns never match.
    pub fn is_match(&self, pattern: &str, destination: &str) -> bool {
        match self.patterns.get(pattern) {
            Some(Some(regex)) => regex.is_match(destination),
            _ => false,
        }
    }

    /// Decide whether an announcement targets a destination
    pub fn matches(&self, announcement: &Announcement, destination: &str) -> bool {
        if announcement.lists(destination) || announcement.is_global() {
            return true;
        }

        announcement
            .destinations
            .iter()
            .any(|pattern| self.is_match(pattern, destination))
    }
}
