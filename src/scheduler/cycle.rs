//! Announcement cycle orchestration
//!
//! [`CycleScheduler`] owns the cycle timer and the rotation cursors. Each
//! fired cycle works on one configuration snapshot from start to finish:
//!
//! 1. Colorize the prefix once.
//! 2. For every connected user with a destination who is not ignoring it,
//!    select an announcement. Selection is memoized per destination, so all
//!    users on one destination get the same announcement and the cursor
//!    advances once.
//! 3. Render each user's message, falling back to plain text per user when a
//!    rich text body fails to parse.
//! 4. Dispatch through the configured mode.
//! 5. Drop cursors for destinations nobody eligible is on anymore.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::rotation::RotationIndex;
use super::selector::{Select, Selector};
use super::trigger::CycleTimer;
use crate::config::ConfigHandle;
use crate::directory::ConnectionDirectory;
use crate::dispatch::{Dispatch, DispatchRouter, DispatchSummary, DisplayMode, Transport};
use crate::format::{self, TextFormatter};
use crate::metrics;
use crate::models::Announcement;

// ============================================================================
// Cycle Report
// ============================================================================

/// What one fired cycle did
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub fired_at: DateTime<Utc>,
    pub catalog_size: usize,
    /// Announcement chosen per destination (`None` when nothing matched)
    pub selections: BTreeMap<String, Option<String>>,
    /// Users a message was built for
    pub deliveries: usize,
    /// Users whose destination had no matching announcement
    pub skipped_users: usize,
    pub ignored_users: usize,
    /// Users still connecting, without a destination
    pub connecting_users: usize,
    pub rich_text_fallbacks: usize,
    /// Cursors removed by pruning
    pub pruned: usize,
    pub dispatch: DispatchSummary,
}

impl CycleReport {
    fn new(catalog_size: usize, mode: DisplayMode) -> Self {
        Self {
            fired_at: Utc::now(),
            catalog_size,
            selections: BTreeMap::new(),
            deliveries: 0,
            skipped_users: 0,
            ignored_users: 0,
            connecting_users: 0,
            rich_text_fallbacks: 0,
            pruned: 0,
            dispatch: DispatchSummary::new(mode),
        }
    }

    /// Announcement selected for a destination in this cycle
    pub fn selection(&self, destination: &str) -> Option<&str> {
        self.selections.get(destination)?.as_deref()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle at {}: {} destination(s), {} message(s), {} skipped, {} ignored {}",
            self.fired_at.format("%H:%M:%S"),
            self.selections.len(),
            self.deliveries,
            self.skipped_users,
            self.ignored_users,
            self.dispatch
        )
    }
}

// ============================================================================
// Cycle Scheduler
// ============================================================================

/// Tick-driven announcement scheduler
pub struct CycleScheduler {
    config: ConfigHandle,
    directory: Arc<dyn ConnectionDirectory>,
    formatter: Arc<dyn TextFormatter>,
    transport: Arc<dyn Transport>,
    selector: Box<dyn Select>,
    timer: CycleTimer,
    cursors: RotationIndex,
}

impl CycleScheduler {
    /// Create a scheduler with an entropy-seeded selector
    pub fn new(
        config: ConfigHandle,
        directory: Arc<dyn ConnectionDirectory>,
        formatter: Arc<dyn TextFormatter>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            directory,
            formatter,
            transport,
            selector: Box::new(Selector::new()),
            timer: CycleTimer::new(),
            cursors: RotationIndex::new(),
        }
    }

    /// Use a different selector
    pub fn with_selector<S: Select + 'static>(mut self, selector: S) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Host entry point, called once per tick
    pub fn tick(&mut self) {
        let _ = self.on_tick();
    }

    /// Advance the timer; runs a cycle when it fires
    pub fn on_tick(&mut self) -> Option<CycleReport> {
        let delay = self.config.delay();
        if !self.timer.tick(delay) {
            return None;
        }
        Some(self.run_cycle())
    }

    /// Run a cycle now and restart the timer
    pub fn fire_now(&mut self) -> CycleReport {
        self.timer.reset();
        self.run_cycle()
    }

    /// Rotation cursors
    pub fn cursors(&self) -> &RotationIndex {
        &self.cursors
    }

    /// Mutable rotation cursors
    pub fn cursors_mut(&mut self) -> &mut RotationIndex {
        &mut self.cursors
    }

    /// Cycle timer
    pub fn timer(&self) -> &CycleTimer {
        &self.timer
    }

    /// Live configuration handle
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    fn run_cycle(&mut self) -> CycleReport {
        let _timer = metrics::start_cycle_timer();

        let snapshot = self.config.load();
        let settings = &snapshot.settings;
        let catalog = &snapshot.catalog;

        let mut report = CycleReport::new(catalog.len(), settings.display);
        metrics::record_cycle_fired(catalog.len());

        if catalog.is_empty() {
            tracing::debug!("Announcement catalog is empty, nothing to send");
            return report;
        }

        let prefix = self.formatter.colorize(&settings.prefix);
        let mut memo: HashMap<String, Option<Arc<Announcement>>> = HashMap::new();
        let mut active = HashSet::new();
        let mut messages = BTreeMap::new();

        for user in self.directory.connected_users() {
            let Some(destination) = user.destination else {
                report.connecting_users += 1;
                continue;
            };

            if self.directory.is_ignoring(&user.name, &destination) {
                report.ignored_users += 1;
                continue;
            }

            active.insert(destination.clone());

            let selected = match memo.get(&destination).cloned() {
                Some(selected) => selected,
                None => {
                    self.cursors.observe(&destination);
                    let selected = self.selector.select_for(
                        &destination,
                        catalog,
                        settings.method,
                        &mut self.cursors,
                    );

                    tracing::debug!(
                        destination = %destination,
                        method = %settings.method,
                        announcement = selected.as_ref().map(|a| a.name.as_str()),
                        "Selected announcement"
                    );
                    if selected.is_none() {
                        metrics::record_selection_miss(settings.method.as_str());
                    }

                    report
                        .selections
                        .insert(destination.clone(), selected.as_ref().map(|a| a.name.clone()));
                    memo.insert(destination, selected.clone());
                    selected
                }
            };

            let Some(announcement) = selected else {
                report.skipped_users += 1;
                continue;
            };

            let rendered = format::render(self.formatter.as_ref(), &prefix, &announcement.text);
            if rendered.fallback.is_some() {
                report.rich_text_fallbacks += 1;
            }
            messages.insert(user.name, rendered.message);
        }

        report.deliveries = messages.len();

        let plan = Dispatch::from_settings(settings, self.formatter.as_ref());
        report.dispatch = DispatchRouter::new(self.directory.as_ref(), self.transport.as_ref())
            .route(&plan, messages);

        report.pruned = self.cursors.prune(&active);

        metrics::record_dispatch(
            plan.mode().as_str(),
            report.dispatch.delivered,
            report.dispatch.failed,
        );
        metrics::record_rich_text_fallbacks(report.rich_text_fallbacks);
        metrics::set_tracked_destinations(self.cursors.len());

        tracing::info!(
            destinations = report.selections.len(),
            messages = report.deliveries,
            delivered = report.dispatch.delivered,
            skipped = report.skipped_users,
            ignored = report.ignored_users,
            pruned = report.pruned,
            mode = %plan.mode(),
            "Announcement cycle fired"
        );

        report
    }
}

impl fmt::Debug for CycleScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleScheduler")
            .field("config", &self.config)
            .field("timer", &self.timer)
            .field("cursors", &self.cursors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnnouncementConfig, Config};
    use crate::directory::{RosterDirectory, IGNORE_ALL_PERMISSION};
    use crate::dispatch::ConsoleTransport;
    use crate::format::LegacyFormatter;

    fn announcement(name: &str, servers: &[&str]) -> AnnouncementConfig {
        AnnouncementConfig {
            name: name.to_string(),
            text: format!("&a{name}"),
            servers: servers.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn build(config: Config, roster: Arc<RosterDirectory>) -> CycleScheduler {
        CycleScheduler::new(
            ConfigHandle::new(&config),
            roster,
            Arc::new(LegacyFormatter::new()),
            Arc::new(ConsoleTransport::new()),
        )
        .with_selector(Selector::with_seed(7))
    }

    #[test]
    fn test_on_tick_respects_delay() {
        let roster = Arc::new(RosterDirectory::new());
        roster.connect("alice", "lobby");
        let config = Config {
            delay: 3,
            announcements: vec![announcement("a", &["global"])],
            ..Default::default()
        };
        let mut scheduler = build(config, roster);

        assert!(scheduler.on_tick().is_none());
        assert!(scheduler.on_tick().is_none());
        let report = scheduler.on_tick().unwrap();
        assert_eq!(report.selection("lobby"), Some("a"));
        assert_eq!(scheduler.timer().elapsed(), 0);
    }

    #[test]
    fn test_empty_catalog_fires_without_sending() {
        let roster = Arc::new(RosterDirectory::new());
        roster.connect("alice", "lobby");
        let mut scheduler = build(Config::default(), roster);

        let report = scheduler.fire_now();
        assert_eq!(report.catalog_size, 0);
        assert_eq!(report.deliveries, 0);
        assert!(scheduler.cursors().is_empty());
    }

    #[test]
    fn test_connecting_and_ignoring_users_are_skipped() {
        let roster = Arc::new(RosterDirectory::new());
        roster.connect("alice", "lobby");
        roster.connect("bob", "lobby");
        roster.connect_pending("carol");
        roster.grant("bob", IGNORE_ALL_PERMISSION);

        let config = Config {
            announcements: vec![announcement("a", &["global"])],
            ..Default::default()
        };
        let mut scheduler = build(config, roster);
        let report = scheduler.fire_now();

        assert_eq!(report.deliveries, 1);
        assert_eq!(report.ignored_users, 1);
        assert_eq!(report.connecting_users, 1);
        assert_eq!(report.dispatch.delivered, 1);
    }

    #[test]
    fn test_no_match_skips_user_but_keeps_cursor() {
        let roster = Arc::new(RosterDirectory::new());
        roster.connect("alice", "survival");

        let config = Config {
            announcements: vec![announcement("lobby-only", &["lobby"])],
            ..Default::default()
        };
        let mut scheduler = build(config, roster);
        let report = scheduler.fire_now();

        assert_eq!(report.selection("survival"), None);
        assert_eq!(report.skipped_users, 1);
        assert_eq!(scheduler.cursors().get("survival"), Some(0));
    }

    #[test]
    fn test_report_display() {
        let report = CycleReport::new(2, DisplayMode::Chat);
        let text = report.to_string();
        assert!(text.contains("0 message(s)"));
        assert!(text.contains("[chat]"));
    }
}
