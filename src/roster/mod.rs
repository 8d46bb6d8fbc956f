/// Roster of tracked names
///
/// Two sub-rosters feed the matcher: the curated list shipped with the
/// indexer and a user-editable list read from a plain-text file. Matching
/// treats them as one ordered set; the source is kept only for statistics.

pub mod players;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use players::{CURATED_PLAYERS, EXAMPLE_FRIENDS};

/// Which sub-roster a name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RosterSource {
    Curated,
    User,
}

/// A name searched for in transcripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedName {
    pub name: String,
    pub source: RosterSource,
}

/// Outcome of loading the user roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterLoad {
    /// User file read, with this many names
    Loaded(usize),
    /// User file missing or unreadable; this many example names used instead
    FallbackUsed(usize),
}

/// Ordered, duplicate-free set of tracked names
#[derive(Debug, Clone, Default)]
pub struct Roster {
    names: Vec<TrackedName>,
    seen: HashSet<String>,
}

impl Roster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from explicit curated and user lists
    pub fn from_lists<C, U>(curated: C, user: U) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let mut roster = Self::new();
        for name in curated {
            roster.add(name.as_ref(), RosterSource::Curated);
        }
        for name in user {
            roster.add(name.as_ref(), RosterSource::User);
        }
        roster
    }

    /// Load the built-in curated list plus the user list at `user_file`.
    ///
    /// Never fails: a missing or unreadable user file falls back to the
    /// example friends and reports it through [`RosterLoad::FallbackUsed`].
    pub async fn load(user_file: Option<&Path>) -> (Self, RosterLoad) {
        let user_names = match user_file {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(content) => {
                    let names = parse_roster_file(&content);
                    info!("✅ Loaded {} user roster names from {}", names.len(), path.display());
                    Some(names)
                }
                Err(e) => {
                    warn!("⚠️ User roster {} not readable ({}), using example friends", path.display(), e);
                    None
                }
            },
            None => None,
        };

        match user_names {
            Some(names) => {
                let count = names.len();
                (Self::from_lists(CURATED_PLAYERS, names), RosterLoad::Loaded(count))
            }
            None => (
                Self::from_lists(CURATED_PLAYERS, EXAMPLE_FRIENDS),
                RosterLoad::FallbackUsed(EXAMPLE_FRIENDS.len()),
            ),
        }
    }

    /// Add a name; returns false if it was empty or already present.
    ///
    /// Names are compared case-insensitively since matching is.
    pub fn add(&mut self, name: &str, source: RosterSource) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        if !self.seen.insert(name.to_lowercase()) {
            return false;
        }
        self.names.push(TrackedName {
            name: name.to_string(),
            source,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedName> {
        self.names.iter()
    }

    /// Names in roster order
    pub fn names(&self) -> Vec<String> {
        self.names.iter().map(|n| n.name.clone()).collect()
    }

    pub fn source_of(&self, name: &str) -> Option<RosterSource> {
        self.names.iter().find(|n| n.name == name).map(|n| n.source)
    }

    pub fn stats(&self) -> RosterStats {
        let user = self.names.iter().filter(|n| n.source == RosterSource::User).count();
        RosterStats {
            curated: self.names.len() - user,
            user,
            total_tracked: self.names.len(),
        }
    }
}

/// Size of each sub-roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterStats {
    pub curated: usize,
    pub user: usize,
    pub total_tracked: usize,
}

/// One name per line; blank lines and `#` comments are skipped.
fn parse_roster_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
