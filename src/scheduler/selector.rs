//! Announcement selection
//!
//! Two policies pick one announcement for a destination out of a catalog
//! snapshot:
//!
//! - **Sequential**: walk the destination's rotation cursor, advancing it on
//!   every attempt whether or not the candidate matches.
//! - **Random**: draw uniformly; when every draw misses, fall back to a linear
//!   scan so an existing match is always found.
//!
//! Both policies give up after [`MAX_ATTEMPTS`] candidates (the random
//! policy's fallback scan aside).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::catalog::Catalog;
use super::error::SchedulerError;
use super::rotation::RotationIndex;
use crate::models::Announcement;

/// Candidates examined per selection before giving up
pub const MAX_ATTEMPTS: usize = 5;

// ============================================================================
// Selection Method
// ============================================================================

/// Policy used to pick an announcement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SelectionMethod {
    /// Round-robin over the catalog, per destination
    #[default]
    Sequential,
    /// Uniform random draw with a linear-scan fallback
    Random,
}

impl SelectionMethod {
    /// Get method ID as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SelectionMethod {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" | "seq" | "ordered" => Ok(Self::Sequential),
            "random" | "rand" | "shuffle" => Ok(Self::Random),
            _ => Err(SchedulerError::invalid_method(s)),
        }
    }
}

impl TryFrom<String> for SelectionMethod {
    type Error = SchedulerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Selector
// ============================================================================

/// Strategy seam for picking an announcement for one destination
///
/// The cycle scheduler calls this at most once per destination per cycle.
pub trait Select: Send {
    /// Pick an announcement for `destination`, or `None` when nothing matches
    fn select_for(
        &mut self,
        destination: &str,
        catalog: &Catalog,
        method: SelectionMethod,
        cursors: &mut RotationIndex,
    ) -> Option<Arc<Announcement>>;
}

/// Default selector implementing both policies
#[derive(Debug, Clone)]
pub struct Selector {
    rng: ChaCha8Rng,
}

impl Selector {
    /// Create a selector with a randomly seeded generator
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a selector with a fixed seed for reproducible random draws
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Sequential round-robin selection
    pub fn select_sequential(
        &mut self,
        destination: &str,
        catalog: &Catalog,
        cursors: &mut RotationIndex,
    ) -> Option<Arc<Announcement>> {
        let len = catalog.len();

        for attempt in 0..MAX_ATTEMPTS {
            let position = cursors.current(destination, len);
            let candidate = catalog.get(position)?;

            // The cursor moves on every attempt so a miss is not repeated
            cursors.advance(destination, len);

            if catalog.matches(candidate, destination) {
                tracing::debug!(
                    destination,
                    announcement = %candidate.name,
                    position,
                    attempt,
                    "Selected announcement sequentially"
                );
                return Some(Arc::clone(candidate));
            }
        }

        tracing::debug!(destination, "No sequential match within attempt budget");
        None
    }

    /// Random selection with linear-scan fallback
    pub fn select_random(
        &mut self,
        destination: &str,
        catalog: &Catalog,
    ) -> Option<Arc<Announcement>> {
        if catalog.is_empty() {
            return None;
        }

        for attempt in 0..MAX_ATTEMPTS {
            let position = self.rng.gen_range(0..catalog.len());
            let candidate = catalog.get(position)?;

            if catalog.matches(candidate, destination) {
                tracing::debug!(
                    destination,
                    announcement = %candidate.name,
                    position,
                    attempt,
                    "Selected announcement randomly"
                );
                return Some(Arc::clone(candidate));
            }
        }

        let found = catalog.first_match(destination).cloned();
        tracing::debug!(
            destination,
            found = found.is_some(),
            "Random draws missed, fell back to linear scan"
        );
        found
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Select for Selector {
    fn select_for(
        &mut self,
        destination: &str,
        catalog: &Catalog,
        method: SelectionMethod,
        cursors: &mut RotationIndex,
    ) -> Option<Arc<Announcement>> {
        match method {
            SelectionMethod::Sequential => self.select_sequential(destination, catalog, cursors),
            SelectionMethod::Random => self.select_random(destination, catalog),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
