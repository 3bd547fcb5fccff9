//! announcer - Rotating announcements for multi-backend proxies
//!
//! Every N ticks the scheduler picks one announcement per destination
//! (backend server) and delivers it to the users connected there, as a chat
//! message, a repeating action bar, or a title overlay.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration loading, validation and live reload
//! - [`models`] - Core data structures and types
//! - [`scheduler`] - Cycle gate, rotation cursors, selection and matching
//! - [`format`] - Legacy color codes and JSON chat components
//! - [`directory`] - Connected users, destinations and permissions
//! - [`dispatch`] - Delivery modes and transports
//! - [`metrics`] - Prometheus metrics
//! - [`error`] - Crate-level error joining the module errors
//!
//! # Example
//!
//! ```no_run
//! use announcer::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file(Path::new("announcer.toml"))?;
//!     config.validate()?;
//!
//!     let roster = Arc::new(RosterDirectory::new());
//!     roster.connect("alice", "lobby");
//!
//!     let mut scheduler = CycleScheduler::new(
//!         ConfigHandle::new(&config),
//!         roster,
//!         Arc::new(LegacyFormatter::new()),
//!         Arc::new(ConsoleTransport::new()),
//!     );
//!
//!     if let Some(report) = scheduler.on_tick() {
//!         println!("{report}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod metrics;
pub mod models;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigHandle};
    pub use crate::directory::{ConnectedUser, ConnectionDirectory, RosterDirectory};
    pub use crate::dispatch::{ConsoleTransport, DisplayMode, Transport};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::format::{FormattedMessage, LegacyFormatter, TextFormatter};
    pub use crate::models::Announcement;
    pub use crate::scheduler::{CycleReport, CycleScheduler, SelectionMethod, TickDriver};
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use models::{Announcement, GLOBAL_DESTINATION};
