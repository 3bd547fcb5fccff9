//! Logging transport
//!
//! Writes every delivery to the tracing output. Used by the CLI `run`
//! command in place of a real proxy connection.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::action_bar::{ActionBarRepeater, ActionBarSink};
use super::{TitleMessage, Transport, TransportError, TransportResult};
use crate::directory::ConnectionDirectory;
use crate::format::FormattedMessage;

/// Action bar output that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ActionBarSink for ConsoleSink {
    fn send_action_bar(&self, user: &str, message: &FormattedMessage) -> TransportResult<()> {
        tracing::info!(target: "announcer::console", user, mode = "action", "{message}");
        Ok(())
    }
}

/// Transport that logs deliveries and stores nothing
#[derive(Default)]
pub struct ConsoleTransport {
    repeater: Option<ActionBarRepeater>,
    directory: Option<Arc<dyn ConnectionDirectory>>,
}

impl ConsoleTransport {
    /// Create a transport that logs action bars once
    pub fn new() -> Self {
        Self::default()
    }

    /// Repeat action bars through a tokio task
    pub fn with_repeater(mut self, repeater: ActionBarRepeater) -> Self {
        self.repeater = Some(repeater);
        self
    }

    /// Refuse sends to users missing from `directory` and repeat action
    /// bars to the ones present
    pub fn with_directory(mut self, directory: Arc<dyn ConnectionDirectory>) -> Self {
        self.directory = Some(Arc::clone(&directory));
        self.with_repeater(ActionBarRepeater::new(Arc::new(ConsoleSink), directory))
    }

    fn ensure_online(&self, user: &str) -> TransportResult<()> {
        match &self.directory {
            Some(directory) if !directory.is_online(user) => {
                Err(TransportError::UserGone(user.to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for ConsoleTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleTransport")
            .field("repeater", &self.repeater)
            .field("directory", &self.directory.is_some())
            .finish()
    }
}

impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    fn send_chat(&self, user: &str, message: &FormattedMessage) -> TransportResult<()> {
        self.ensure_online(user)?;
        tracing::info!(target: "announcer::console", user, mode = "chat", "{message}");
        Ok(())
    }

    fn send_title(&self, user: &str, title: &TitleMessage) -> TransportResult<()> {
        self.ensure_online(user)?;
        tracing::info!(
            target: "announcer::console",
            user,
            mode = "title",
            title = %title.title,
            fade_in = title.fade_in,
            stay = title.stay,
            fade_out = title.fade_out,
            "{}",
            title.subtitle
        );
        Ok(())
    }

    fn start_action_bar_cycle(
        &self,
        messages: BTreeMap<String, FormattedMessage>,
        period_ticks: u32,
    ) -> TransportResult<()> {
        match &self.repeater {
            Some(repeater) => {
                // Task is detached; it ends on its own after `period_ticks` sends
                repeater.start(messages, period_ticks)?;
            }
            None => {
                for (user, message) in &messages {
                    ConsoleSink.send_action_bar(user, message)?;
                }
            }
        }
        Ok(())
    }
}
