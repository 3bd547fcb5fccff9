//! Announcement scheduling system
//!
//! This module decides, every N ticks, which announcement each destination
//! (backend server) receives and hands the result to the dispatch layer.
//!
//! # Features
//!
//! - **Tick Gate**: a cycle fires once every `delay` ticks
//! - **Per-Destination Rotation**: each destination walks the catalog with its own cursor
//! - **Sequential / Random Selection**: bounded retries, random falls back to a scan
//! - **Destination Matching**: literal names, the `global` sentinel, or regex patterns
//! - **Memoized Selection**: all users on a destination share one pick per cycle
//! - **Cursor Pruning**: cursors for empty destinations are dropped each cycle
//! - **Event Broadcasting**: fired cycles are published via tokio channels
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────────────────────┐
//! │  TickDriver  │────▶│              CycleScheduler              │
//! └──────────────┘     │  ┌────────────┐  ┌────────────────────┐  │
//!                      │  │ CycleTimer │  │   RotationIndex    │  │
//!                      │  └────────────┘  └─────────┬──────────┘  │
//!                      │                            │             │
//!                      │  ┌─────────────┐   ┌───────▼──────────┐  │
//!                      │  │   Catalog   │◀──│     Selector     │  │
//!                      │  │ (+ regexes) │   └──────────────────┘  │
//!                      │  └─────────────┘                         │
//!                      └────────────────────┬─────────────────────┘
//!                                           ▼
//!                                    DispatchRouter
//! ```
//!
//! # Modules
//!
//! - [`catalog`] - Ordered announcement list with compiled patterns
//! - [`matcher`] - Destination pattern compilation and matching
//! - [`rotation`] - Per-destination rotation cursors
//! - [`selector`] - Sequential and random selection policies
//! - [`cycle`] - Cycle orchestration and reports
//! - [`trigger`] - Tick gate and tokio tick driver
//!
//! # Quick Start
//!
//! ```ignore
//! use announcer::prelude::*;
//! use std::sync::Arc;
//!
//! let config = Config::from_file(path)?;
//! let roster = Arc::new(RosterDirectory::new());
//! roster.connect("alice", "lobby");
//!
//! let mut scheduler = CycleScheduler::new(
//!     ConfigHandle::new(&config),
//!     roster,
//!     Arc::new(LegacyFormatter::new()),
//!     Arc::new(ConsoleTransport::new()),
//! );
//!
//! // Call once per tick
//! scheduler.tick();
//! ```

pub mod catalog;
pub mod cycle;
pub mod error;
pub mod matcher;
pub mod rotation;
pub mod selector;
pub mod trigger;

// Re-export main types
pub use catalog::Catalog;
pub use cycle::{CycleReport, CycleScheduler};
pub use error::{SchedulerError, SchedulerResult};
pub use matcher::{PatternCache, PatternWarning};
pub use rotation::RotationIndex;
pub use selector::{Select, SelectionMethod, Selector, MAX_ATTEMPTS};
pub use trigger::{CycleTimer, TickDriver, TickEvent};
