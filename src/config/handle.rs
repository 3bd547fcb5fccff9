//! Live configuration handle
//!
//! Settings and catalog are published together behind an [`ArcSwap`]. A reload
//! from any thread replaces both atomically; the scheduler takes one
//! `Arc<Snapshot>` per cycle and never observes a half-applied reload.

use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::Arc;

use super::{Config, TitleDisplay};
use crate::dispatch::DisplayMode;
use crate::scheduler::{Catalog, PatternWarning, SelectionMethod};

/// Scheduler-facing settings, without the announcement list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub delay: u32,
    pub prefix: String,
    pub method: SelectionMethod,
    pub display: DisplayMode,
    pub action_bar_period: u32,
    pub title: TitleDisplay,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            delay: config.delay,
            prefix: config.prefix.clone(),
            method: config.method,
            display: config.display,
            action_bar_period: config.action_bar_period,
            title: config.title.clone(),
        }
    }
}

/// Settings and catalog as published by one load
#[derive(Debug)]
pub struct Snapshot {
    pub settings: Settings,
    pub catalog: Catalog,
}

impl Snapshot {
    /// Build a snapshot, compiling the catalog's patterns
    pub fn from_config(config: &Config) -> Self {
        Self {
            settings: Settings::from(config),
            catalog: Catalog::new(config.announcement_list()),
        }
    }
}

/// Shared, atomically replaceable configuration
#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<ArcSwap<Snapshot>>,
}

impl ConfigHandle {
    /// Publish an initial configuration
    pub fn new(config: &Config) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Snapshot::from_config(config))),
        }
    }

    /// Current snapshot; stays valid after later reloads
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Configured cycle delay in ticks
    pub fn delay(&self) -> u32 {
        self.current.load().settings.delay
    }

    /// Replace settings and catalog
    ///
    /// Returns the pattern warnings of the new catalog.
    pub fn reload(&self, config: &Config) -> Vec<PatternWarning> {
        let snapshot = Snapshot::from_config(config);
        let warnings = snapshot.catalog.warnings().to_vec();

        tracing::info!(
            announcements = snapshot.catalog.len(),
            pattern_warnings = warnings.len(),
            invalid_patterns = snapshot.catalog.invalid_patterns(),
            delay = snapshot.settings.delay,
            method = %snapshot.settings.method,
            display = %snapshot.settings.display,
            "Configuration reloaded"
        );

        self.current.store(Arc::new(snapshot));
        warnings
    }

    /// Load, validate and publish a configuration file
    ///
    /// On error the current snapshot stays in place.
    pub fn reload_from_file(&self, path: &Path) -> crate::Result<Vec<PatternWarning>> {
        let config = Config::load(path)?;
        Ok(self.reload(&config))
    }
}

impl std::fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("ConfigHandle")
            .field("settings", &snapshot.settings)
            .field("announcements", &snapshot.catalog.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnouncementConfig;

    fn config_with(names: &[&str]) -> Config {
        Config {
            announcements: names
                .iter()
                .map(|name| AnnouncementConfig {
                    name: name.to_string(),
                    text: format!("{name} text"),
                    servers: vec!["global".to_string()],
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let handle = ConfigHandle::new(&config_with(&["a", "b"]));
        let before = handle.load();

        handle.reload(&config_with(&["c"]));
        let after = handle.load();

        assert_eq!(before.catalog.len(), 2);
        assert_eq!(after.catalog.len(), 1);
        assert_eq!(after.catalog.get(0).unwrap().name, "c");
    }

    #[test]
    fn test_reload_changes_delay() {
        let handle = ConfigHandle::new(&Config::default());
        assert_eq!(handle.delay(), 300);

        handle.reload(&Config {
            delay: 5,
            ..Default::default()
        });
        assert_eq!(handle.delay(), 5);
    }

    #[test]
    fn test_reload_reports_pattern_warnings() {
        let handle = ConfigHandle::new(&Config::default());
        let mut config = config_with(&["bad"]);
        config.announcements[0].servers = vec!["(".to_string()];

        let warnings = handle.reload(&config);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].announcement, "bad");
    }

    #[test]
    fn test_clones_share_state() {
        let handle = ConfigHandle::new(&Config::default());
        let other = handle.clone();
        other.reload(&config_with(&["x"]));
        assert_eq!(handle.load().catalog.len(), 1);
    }
}
