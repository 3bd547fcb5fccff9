//! Per-destination rotation cursors
//!
//! Sequential selection walks the catalog once per destination. This module
//! keeps one cursor per destination and enforces:
//! - A cursor always points inside the catalog it is used with
//! - Advancing past the end wraps to the first entry
//! - Destinations without eligible users are dropped after each cycle

use std::collections::{HashMap, HashSet};

// ============================================================================
// Rotation Index
// ============================================================================

/// Cursor store for sequential rotation, keyed by destination name
#[derive(Debug, Clone, Default)]
pub struct RotationIndex {
    cursors: HashMap<String, usize>,
}

impl RotationIndex {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a destination has an eligible user
    ///
    /// Creates a cursor at position 0 if none exists yet.
    pub fn observe(&mut self, destination: &str) {
        if !self.cursors.contains_key(destination) {
            self.cursors.insert(destination.to_string(), 0);
        }
    }

    /// Stored cursor for a destination, if any
    pub fn get(&self, destination: &str) -> Option<usize> {
        self.cursors.get(destination).copied()
    }

    /// Overwrite the cursor for a destination
    pub fn set(&mut self, destination: impl Into<String>, position: usize) {
        self.cursors.insert(destination.into(), position);
    }

    /// Cursor position bounded to a catalog of `catalog_len` entries
    ///
    /// Absent cursors read as 0. A cursor at or beyond the end of the
    /// catalog (the catalog shrank since it was stored) is reset to 0.
    pub fn current(&mut self, destination: &str, catalog_len: usize) -> usize {
        let position = self.get(destination).unwrap_or(0);

        if position >= catalog_len {
            self.cursors.insert(destination.to_string(), 0);
            return 0;
        }

        position
    }

    /// Move a destination's cursor one step forward, wrapping at `catalog_len`
    pub fn advance(&mut self, destination: &str, catalog_len: usize) {
        let next = self.get(destination).unwrap_or(0) + 1;
        let next = if next >= catalog_len { 0 } else { next };
        self.cursors.insert(destination.to_string(), next);
    }

    /// Drop every cursor whose destination is not in `active`
    ///
    /// Returns the number of cursors removed.
    pub fn prune(&mut self, active: &HashSet<String>) -> usize {
        let before = self.cursors.len();
        self.cursors.retain(|destination, _| active.contains(destination));
        before - self.cursors.len()
    }

    /// Number of tracked destinations
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Check if no destination is tracked
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Tracked destinations in sorted order
    pub fn destinations(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.cursors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ============================================================================
// Tests
// ============================================================================
