//! Announcement delivery
//!
//! This module routes one cycle's `{user -> message}` mapping to exactly one
//! delivery mode, chosen by configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             DispatchRouter               │
//! │  - Liveness re-check per user            │
//! │  - Mode routing (one per cycle)          │
//! └──────────────────────────────────────────┘
//!                     │
//!         ┌───────────┼───────────┐
//!         ▼           ▼           ▼
//!   ┌─────────┐ ┌───────────┐ ┌─────────┐
//!   │  Chat   │ │ ActionBar │ │  Title  │
//!   └─────────┘ └───────────┘ └─────────┘
//! ```
//!
//! Transports are fire-and-forget. A failed send is logged and counted; it
//! never aborts delivery to the remaining users.

pub mod action_bar;
pub mod console;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::Settings;
use crate::directory::ConnectionDirectory;
use crate::format::{FormattedMessage, TextFormatter};
use crate::scheduler::SchedulerError;

pub use action_bar::{ActionBarRepeater, ActionBarSink};
pub use console::{ConsoleSink, ConsoleTransport};

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while handing a message to a transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The user is no longer reachable
    #[error("User not connected: {0}")]
    UserGone(String),

    /// Transport temporarily unavailable
    #[error("Transport temporarily unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Display Mode
// ============================================================================

/// Delivery mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DisplayMode {
    /// Chat message
    #[default]
    Chat,
    /// Repeating action bar
    Action,
    /// Title overlay with the announcement as subtitle
    Title,
}

impl DisplayMode {
    /// Get mode ID as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Action => "action",
            Self::Title => "title",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "action" | "actionbar" | "action_bar" => Ok(Self::Action),
            "title" => Ok(Self::Title),
            _ => Err(SchedulerError::invalid_display(s)),
        }
    }
}

impl TryFrom<String> for DisplayMode {
    type Error = SchedulerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Dispatch Plan
// ============================================================================

/// Title overlay sent to one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleMessage {
    pub fade_in: u32,
    pub stay: u32,
    pub fade_out: u32,
    pub title: String,
    pub subtitle: FormattedMessage,
}

/// Delivery mode resolved for one cycle, with its mode-specific settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Chat,
    ActionBar {
        period: u32,
    },
    Title {
        fade_in: u32,
        stay: u32,
        fade_out: u32,
        title: String,
    },
}

impl Dispatch {
    /// Resolve the configured mode, colorizing the title once
    pub fn from_settings(settings: &Settings, formatter: &dyn TextFormatter) -> Self {
        match settings.display {
            DisplayMode::Chat => Self::Chat,
            DisplayMode::Action => Self::ActionBar {
                period: settings.action_bar_period,
            },
            DisplayMode::Title => Self::Title {
                fade_in: settings.title.fade_in,
                stay: settings.title.stay,
                fade_out: settings.title.fade_out,
                title: formatter.colorize(&settings.title.title),
            },
        }
    }

    /// Mode this plan delivers through
    pub fn mode(&self) -> DisplayMode {
        match self {
            Self::Chat => DisplayMode::Chat,
            Self::ActionBar { .. } => DisplayMode::Action,
            Self::Title { .. } => DisplayMode::Title,
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Delivery seam towards the proxy
pub trait Transport: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &str;

    /// Send a chat message to one user
    fn send_chat(&self, user: &str, message: &FormattedMessage) -> TransportResult<()>;

    /// Show a title overlay to one user
    fn send_title(&self, user: &str, title: &TitleMessage) -> TransportResult<()>;

    /// Start a repeating action bar for all users in `messages`
    ///
    /// The transport owns the repeat loop and its lifetime.
    fn start_action_bar_cycle(
        &self,
        messages: BTreeMap<String, FormattedMessage>,
        period_ticks: u32,
    ) -> TransportResult<()>;
}

/// Outcome of routing one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub mode: DisplayMode,
    pub delivered: usize,
    pub skipped_offline: usize,
    pub failed: usize,
}

impl DispatchSummary {
    /// Empty summary for a mode
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            delivered: 0,
            skipped_offline: 0,
            failed: 0,
        }
    }
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] delivered={} offline={} failed={}",
            self.mode, self.delivered, self.skipped_offline, self.failed
        )
    }
}

// ============================================================================
// Router
// ============================================================================

/// Routes per-user messages to the transport
pub struct DispatchRouter<'a> {
    directory: &'a dyn ConnectionDirectory,
    transport: &'a dyn Transport,
}

impl<'a> DispatchRouter<'a> {
    pub fn new(directory: &'a dyn ConnectionDirectory, transport: &'a dyn Transport) -> Self {
        Self {
            directory,
            transport,
        }
    }

    /// Deliver one cycle's messages
    pub fn route(
        &self,
        plan: &Dispatch,
        messages: BTreeMap<String, FormattedMessage>,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::new(plan.mode());

        if messages.is_empty() {
            return summary;
        }

        match plan {
            Dispatch::Chat => {
                for (user, message) in &messages {
                    self.deliver(&mut summary, user, |t| t.send_chat(user, message));
                }
            }
            Dispatch::ActionBar { period } => {
                let count = messages.len();
                match self.transport.start_action_bar_cycle(messages, *period) {
                    Ok(()) => summary.delivered = count,
                    Err(e) => {
                        tracing::warn!(
                            transport = self.transport.name(),
                            error = %e,
                            "Failed to start action bar cycle"
                        );
                        summary.failed = count;
                    }
                }
            }
            Dispatch::Title {
                fade_in,
                stay,
                fade_out,
                title,
            } => {
                for (user, message) in messages {
                    let overlay = TitleMessage {
                        fade_in: *fade_in,
                        stay: *stay,
                        fade_out: *fade_out,
                        title: title.clone(),
                        subtitle: message,
                    };
                    self.deliver(&mut summary, &user, |t| t.send_title(&user, &overlay));
                }
            }
        }

        summary
    }

    fn deliver<F>(&self, summary: &mut DispatchSummary, user: &str, send: F)
    where
        F: FnOnce(&dyn Transport) -> TransportResult<()>,
    {
        // The user may have left between selection and delivery
        if !self.directory.is_online(user) {
            summary.skipped_offline += 1;
            return;
        }

        match send(self.transport) {
            Ok(()) => summary.delivered += 1,
            Err(TransportError::UserGone(_)) => {
                tracing::debug!(user, "User left before delivery");
                summary.skipped_offline += 1;
            }
            Err(e) => {
                tracing::warn!(
                    transport = self.transport.name(),
                    user,
                    error = %e,
                    "Failed to deliver announcement"
                );
                summary.failed += 1;
            }
        }
    }
}
