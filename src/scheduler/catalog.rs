//! Announcement catalog
//!
//! The catalog is the ordered, immutable list of announcements together with
//! the destination patterns compiled for it. A new catalog is built on every
//! configuration load and published inside a config snapshot; a firing cycle
//! holds that snapshot for its whole duration, so concurrent reloads never
//! change what a cycle sees.

use std::sync::Arc;

use super::matcher::{PatternCache, PatternWarning};
use crate::models::Announcement;

/// Ordered announcements plus their compiled destination patterns
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<Arc<Announcement>>,
    patterns: PatternCache,
    warnings: Vec<PatternWarning>,
}

impl Catalog {
    /// Build a catalog, compiling all destination patterns once
    pub fn new(announcements: Vec<Announcement>) -> Self {
        let (patterns, warnings) = PatternCache::build(&announcements);

        Self {
            entries: announcements.into_iter().map(Arc::new).collect(),
            patterns,
            warnings,
        }
    }

    /// Create an empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of announcements
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no announcements
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Announcement at a position in catalog order
    pub fn get(&self, index: usize) -> Option<&Arc<Announcement>> {
        self.entries.get(index)
    }

    /// Find an announcement by name
    pub fn find(&self, name: &str) -> Option<&Arc<Announcement>> {
        self.entries.iter().find(|a| a.name == name)
    }

    /// Iterate announcements in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Announcement>> {
        self.entries.iter()
    }

    /// Check whether an announcement targets the destination
    pub fn matches(&self, announcement: &Announcement, destination: &str) -> bool {
        self.patterns.matches(announcement, destination)
    }

    /// First announcement in catalog order targeting the destination
    pub fn first_match(&self, destination: &str) -> Option<&Arc<Announcement>> {
        self.entries
            .iter()
            .find(|a| self.patterns.matches(a, destination))
    }

    /// Patterns that failed to compile when the catalog was built
    pub fn warnings(&self) -> &[PatternWarning] {
        &self.warnings
    }

    /// Distinct destination patterns that failed to compile
    pub fn invalid_patterns(&self) -> usize {
        self.patterns.invalid_count()
    }
}

impl FromIterator<Announcement> for Catalog {
    fn from_iter<T: IntoIterator<Item = Announcement>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::new(vec![
            Announcement::new("welcome", "Welcome!", ["global"]),
            Announcement::new("lobby", "Lobby tips", ["lobby"]),
            Announcement::new("sky", "Skyblock tips", ["^sky"]),
        ])
    }

    #[test]
    fn test_catalog_order_preserved() {
        let catalog = sample();
        let names: Vec<_> = catalog.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["welcome", "lobby", "sky"]);
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_catalog_first_match() {
        let catalog = Catalog::new(vec![
            Announcement::new("lobby", "Lobby tips", ["lobby"]),
            Announcement::new("sky", "Skyblock tips", ["^sky"]),
        ]);
        assert_eq!(catalog.first_match("skyblock").unwrap().name, "sky");
        assert_eq!(catalog.first_match("lobby").unwrap().name, "lobby");
        assert!(catalog.first_match("survival").is_none());
    }

    #[test]
    fn test_catalog_find_and_get() {
        let catalog = sample();
        assert_eq!(catalog.get(1).unwrap().name, "lobby");
        assert!(catalog.get(3).is_none());
        assert_eq!(catalog.find("sky").unwrap().text, "Skyblock tips");
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_catalog_collects_warnings() {
        let catalog: Catalog = vec![
            Announcement::new("bad", "x", ["(oops"]),
            Announcement::new("worse", "y", ["(oops", "lobby"]),
        ]
        .into_iter()
        .collect();
        // One warning per announcement, one invalid pattern overall
        assert_eq!(catalog.warnings().len(), 2);
        assert_eq!(catalog.invalid_patterns(), 1);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.first_match("lobby").is_none());
    }
}
