//! Common test utilities

use announcer::config::{AnnouncementConfig, Config, ConfigHandle};
use announcer::directory::RosterDirectory;
use announcer::dispatch::{TitleMessage, Transport, TransportError, TransportResult};
use announcer::format::{FormattedMessage, LegacyFormatter};
use announcer::models::Announcement;
use announcer::scheduler::{
    Catalog, CycleScheduler, RotationIndex, Select, SelectionMethod, Selector,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One transport call as seen by [`RecordingTransport`]
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Chat {
        user: String,
        message: FormattedMessage,
    },
    Title {
        user: String,
        title: TitleMessage,
    },
    ActionBar {
        messages: BTreeMap<String, FormattedMessage>,
        period: u32,
    },
}

/// Transport that records every call
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make sends to `user` fail
    pub fn fail_for(&self, user: &str) {
        self.failing.lock().unwrap().insert(user.to_string());
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Chat messages as `(user, plain text)`, in send order
    pub fn chats(&self) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Chat { user, message } => Some((user, message.plain_text())),
                _ => None,
            })
            .collect()
    }

    fn check(&self, user: &str) -> TransportResult<()> {
        if self.failing.lock().unwrap().contains(user) {
            return Err(TransportError::Unavailable(format!("{user} unreachable")));
        }
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    fn send_chat(&self, user: &str, message: &FormattedMessage) -> TransportResult<()> {
        self.check(user)?;
        self.sent.lock().unwrap().push(Sent::Chat {
            user: user.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    fn send_title(&self, user: &str, title: &TitleMessage) -> TransportResult<()> {
        self.check(user)?;
        self.sent.lock().unwrap().push(Sent::Title {
            user: user.to_string(),
            title: title.clone(),
        });
        Ok(())
    }

    fn start_action_bar_cycle(
        &self,
        messages: BTreeMap<String, FormattedMessage>,
        period_ticks: u32,
    ) -> TransportResult<()> {
        self.sent.lock().unwrap().push(Sent::ActionBar {
            messages,
            period: period_ticks,
        });
        Ok(())
    }
}

/// Selector wrapper counting calls
#[allow(dead_code)]
pub struct CountingSelector {
    inner: Selector,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingSelector {
    pub fn new(seed: u64) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let selector = Self {
            inner: Selector::with_seed(seed),
            calls: Arc::clone(&calls),
        };
        (selector, calls)
    }
}

impl Select for CountingSelector {
    fn select_for(
        &mut self,
        destination: &str,
        catalog: &Catalog,
        method: SelectionMethod,
        cursors: &mut RotationIndex,
    ) -> Option<Arc<Announcement>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.select_for(destination, catalog, method, cursors)
    }
}

/// Announcement entry with a plain text body equal to its name
#[allow(dead_code)]
pub fn entry(name: &str, servers: &[&str]) -> AnnouncementConfig {
    AnnouncementConfig {
        name: name.to_string(),
        text: name.to_string(),
        servers: servers.iter().map(|s| s.to_string()).collect(),
    }
}

/// Config firing every tick with an empty prefix
#[allow(dead_code)]
pub fn config_with(entries: Vec<AnnouncementConfig>) -> Config {
    Config {
        delay: 1,
        prefix: String::new(),
        announcements: entries,
        ..Default::default()
    }
}

/// Catalog built from entries
#[allow(dead_code)]
pub fn catalog_of(entries: &[AnnouncementConfig]) -> Catalog {
    entries.iter().map(Announcement::from).collect()
}

/// Scheduler wired to a roster and a recording transport
#[allow(dead_code)]
pub struct Harness {
    pub scheduler: CycleScheduler,
    pub roster: Arc<RosterDirectory>,
    pub transport: Arc<RecordingTransport>,
    pub handle: ConfigHandle,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: Config) -> Self {
        Self::with_selector(config, Selector::with_seed(42))
    }

    pub fn with_selector<S: Select + 'static>(config: Config, selector: S) -> Self {
        let roster = Arc::new(RosterDirectory::new());
        let transport = RecordingTransport::new();
        let handle = ConfigHandle::new(&config);

        let scheduler = CycleScheduler::new(
            handle.clone(),
            roster.clone(),
            Arc::new(LegacyFormatter::new()),
            transport.clone(),
        )
        .with_selector(selector);

        Self {
            scheduler,
            roster,
            transport,
            handle,
        }
    }
}
