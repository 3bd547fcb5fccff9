//! Crate-level error
//!
//! Each module keeps its own error type. [`Error`] joins them where work
//! crosses modules: loading the configuration and roster, building the tick
//! driver and reloading on a signal. Nothing inside a fired cycle returns it.

use std::io;
use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::dispatch::TransportError;
pub use crate::format::FormatError;
pub use crate::scheduler::error::SchedulerError;

/// Which part of the crate an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Config,
    Format,
    Transport,
    Scheduler,
    Io,
}

impl ErrorCategory {
    /// Label used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Format => "format",
            Self::Transport => "transport",
            Self::Scheduler => "scheduler",
            Self::Io => "io",
        }
    }
}

/// Error returned at the crate's outer edges
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Format(_) => ErrorCategory::Format,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether retrying the same operation shortly may succeed
    ///
    /// An unreadable config file is usually one being rewritten in place.
    /// Parse and validation failures need an edit first.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(ConfigError::Read { .. }) => true,
            Self::Config(_) => false,
            Self::Transport(e) => matches!(e, TransportError::Unavailable(_)),
            Self::Io(_) => true,
            Self::Format(_) | Self::Scheduler(_) => false,
        }
    }
}

/// Result type alias using the crate-level [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
