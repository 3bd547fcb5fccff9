//! Repeating action bar delivery
//!
//! An action bar line fades after a couple of seconds on the client, so the
//! same text is re-sent once per interval for the configured period. Each
//! send re-checks that the user is still connected.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{TransportError, TransportResult};
use crate::directory::ConnectionDirectory;
use crate::format::FormattedMessage;

/// Low-level action bar output
pub trait ActionBarSink: Send + Sync {
    /// Show one action bar line to one user
    fn send_action_bar(&self, user: &str, message: &FormattedMessage) -> TransportResult<()>;
}

/// Spawns a tokio task per started cycle
#[derive(Clone)]
pub struct ActionBarRepeater {
    sink: Arc<dyn ActionBarSink>,
    directory: Arc<dyn ConnectionDirectory>,
    interval: Duration,
}

impl ActionBarRepeater {
    /// Create a repeater sending once per second
    pub fn new(sink: Arc<dyn ActionBarSink>, directory: Arc<dyn ConnectionDirectory>) -> Self {
        Self {
            sink,
            directory,
            interval: Duration::from_secs(1),
        }
    }

    /// Override the resend interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start re-sending `messages` `period` times
    ///
    /// The returned handle resolves to the number of lines actually sent.
    /// Fails when called outside a tokio runtime.
    pub fn start(
        &self,
        messages: BTreeMap<String, FormattedMessage>,
        period: u32,
    ) -> TransportResult<JoinHandle<usize>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Unavailable(format!("no async runtime: {e}")))?;

        let sink = Arc::clone(&self.sink);
        let directory = Arc::clone(&self.directory);
        let interval = self.interval;

        Ok(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sent = 0;

            for _ in 0..period {
                ticker.tick().await;

                for (user, message) in &messages {
                    if !directory.is_online(user) {
                        continue;
                    }
                    match sink.send_action_bar(user, message) {
                        Ok(()) => sent += 1,
                        Err(e) => tracing::debug!(user, error = %e, "Action bar send failed"),
                    }
                }
            }

            sent
        }))
    }
}

impl std::fmt::Debug for ActionBarRepeater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBarRepeater")
            .field("interval", &self.interval)
            .finish()
    }
}
