//! The set of player names currently bound to a match.
//!
//! # Concurrency note
//!
//! `ActivePlayers` is NOT thread-safe by itself; it's a plain
//! `HashSet`. Sharing happens one level up, in [`Registry`](crate::Registry),
//! which puts it behind a mutex so every check-and-insert is a single
//! critical section.

use std::collections::HashSet;

use nimd_protocol::PlayerName;

/// Names of every player that is in (or about to start) a match.
///
/// There is no capacity limit; the set grows with the number of players.
#[derive(Debug, Default)]
pub struct ActivePlayers {
    names: HashSet<PlayerName>,
}

impl ActivePlayers {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` unless it is already present.
    ///
    /// Returns `true` if the name was inserted, `false` (and no change)
    /// if it was already active.
    pub fn try_register(&mut self, name: &PlayerName) -> bool {
        if self.names.contains(name.as_str()) {
            return false;
        }
        self.names.insert(name.clone())
    }

    /// Removes `name`. Removing a name that isn't present is a no-op.
    pub fn unregister(&mut self, name: &str) {
        self.names.remove(name);
    }

    /// Returns `true` if `name` is currently active.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of active names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nobody is active.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over the active names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &PlayerName> {
        self.names.iter()
    }
}
