//! Connected users and their destinations
//!
//! The scheduler never talks to the proxy's connection layer directly. It
//! reads users through [`ConnectionDirectory`]; [`RosterDirectory`] is an
//! in-memory implementation used by the CLI and tests.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use crate::config::{ConfigError, ConfigResult};

/// Permission that opts a user out of all announcements
pub const IGNORE_ALL_PERMISSION: &str = "announcer.ignore";

/// Permission that opts a user out of announcements on one destination
pub fn ignore_destination_permission(destination: &str) -> String {
    format!("announcer.ignore.server.{destination}")
}

/// A user as seen by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedUser {
    /// Unique user name
    pub name: String,
    /// Destination the user is on; `None` while still connecting
    pub destination: Option<String>,
}

impl ConnectedUser {
    /// Create a user on a destination
    pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: Some(destination.into()),
        }
    }

    /// Create a user that has not reached a destination yet
    pub fn connecting(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: None,
        }
    }
}

/// Source of connected users and their permissions
pub trait ConnectionDirectory: Send + Sync {
    /// Users connected right now
    fn connected_users(&self) -> Vec<ConnectedUser>;

    /// Evaluate a permission node for a user
    fn has_permission(&self, user: &str, node: &str) -> bool;

    /// Whether the user is still connected
    fn is_online(&self, user: &str) -> bool;

    /// Whether the user opted out of announcements on `destination`
    fn is_ignoring(&self, user: &str, destination: &str) -> bool {
        self.has_permission(user, IGNORE_ALL_PERMISSION)
            || self.has_permission(user, &ignore_destination_permission(destination))
    }
}

// ============================================================================
// Roster Directory
// ============================================================================

#[derive(Debug, Clone, Default)]
struct RosterEntry {
    destination: Option<String>,
    permissions: BTreeSet<String>,
}

/// One user line of a roster file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterUser {
    pub name: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RosterFile {
    #[serde(default)]
    users: Vec<RosterUser>,
}

/// In-memory directory of users
#[derive(Debug, Default)]
pub struct RosterDirectory {
    users: RwLock<BTreeMap<String, RosterEntry>>,
}

impl RosterDirectory {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from user records
    pub fn from_users(users: impl IntoIterator<Item = RosterUser>) -> Self {
        let roster = Self::new();
        for user in users {
            let mut entries = roster.write();
            let entry = entries.entry(user.name).or_default();
            entry.destination = user.server;
            entry.permissions.extend(user.permissions);
        }
        roster
    }

    /// Parse a roster from TOML (`[[users]]` tables)
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: RosterFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<roster>".to_string(),
            source: e,
        })?;
        Ok(Self::from_users(file.users))
    }

    /// Load a roster file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: RosterFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::from_users(file.users))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, RosterEntry>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, RosterEntry>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connect a user directly onto a destination
    pub fn connect(&self, user: impl Into<String>, destination: impl Into<String>) {
        let mut users = self.write();
        users.entry(user.into()).or_default().destination = Some(destination.into());
    }

    /// Connect a user that has not reached a destination yet
    pub fn connect_pending(&self, user: impl Into<String>) {
        self.write().entry(user.into()).or_default();
    }

    /// Move a connected user to another destination
    ///
    /// Returns `false` when the user is not connected.
    pub fn move_to(&self, user: &str, destination: impl Into<String>) -> bool {
        match self.write().get_mut(user) {
            Some(entry) => {
                entry.destination = Some(destination.into());
                true
            }
            None => false,
        }
    }

    /// Disconnect a user
    pub fn disconnect(&self, user: &str) -> bool {
        self.write().remove(user).is_some()
    }

    /// Grant a permission node to a connected user
    pub fn grant(&self, user: &str, node: impl Into<String>) -> bool {
        match self.write().get_mut(user) {
            Some(entry) => entry.permissions.insert(node.into()),
            None => false,
        }
    }

    /// Number of connected users
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if nobody is connected
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl ConnectionDirectory for RosterDirectory {
    fn connected_users(&self) -> Vec<ConnectedUser> {
        self.read()
            .iter()
            .map(|(name, entry)| ConnectedUser {
                name: name.clone(),
                destination: entry.destination.clone(),
            })
            .collect()
    }

    fn has_permission(&self, user: &str, node: &str) -> bool {
        self.read()
            .get(user)
            .is_some_and(|entry| entry.permissions.contains(node))
    }

    fn is_online(&self, user: &str) -> bool {
        self.read().contains_key(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_destination_permission() {
        assert_eq!(
            ignore_destination_permission("lobby"),
            "announcer.ignore.server.lobby"
        );
    }

    #[test]
    fn test_roster_connect_and_move() {
        let roster = RosterDirectory::new();
        roster.connect("alice", "lobby");
        roster.connect_pending("bob");

        let users = roster.connected_users();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0], ConnectedUser::new("alice", "lobby"));
        assert_eq!(users[1], ConnectedUser::connecting("bob"));

        assert!(roster.move_to("bob", "survival"));
        assert!(!roster.move_to("carol", "survival"));
        assert_eq!(roster.connected_users()[1].destination.as_deref(), Some("survival"));
    }

    #[test]
    fn test_roster_disconnect() {
        let roster = RosterDirectory::new();
        roster.connect("alice", "lobby");
        assert!(roster.is_online("alice"));
        assert!(roster.disconnect("alice"));
        assert!(!roster.is_online("alice"));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_roster_ignore_permissions() {
        let roster = RosterDirectory::new();
        roster.connect("alice", "lobby");
        roster.connect("bob", "lobby");
        roster.grant("alice", IGNORE_ALL_PERMISSION);
        roster.grant("bob", ignore_destination_permission("survival"));

        assert!(roster.is_ignoring("alice", "lobby"));
        assert!(!roster.is_ignoring("bob", "lobby"));
        assert!(roster.is_ignoring("bob", "survival"));
        assert!(!roster.grant("nobody", IGNORE_ALL_PERMISSION));
    }

    #[test]
    fn test_roster_from_toml() {
        let roster = RosterDirectory::from_toml_str(
            r#"
            [[users]]
            name = "alice"
            server = "lobby"

            [[users]]
            name = "bob"
            permissions = ["announcer.ignore"]
            "#,
        )
        .unwrap();

        assert_eq!(roster.len(), 2);
        assert!(roster.has_permission("bob", IGNORE_ALL_PERMISSION));
        assert_eq!(roster.connected_users()[1].destination, None);
    }

    #[test]
    fn test_roster_from_toml_invalid() {
        let result = RosterDirectory::from_toml_str("[[users]]\nserver = 3");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
