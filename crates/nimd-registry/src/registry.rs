//! The shared registry handle and the registrations it hands out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nimd_protocol::PlayerName;

use crate::{ActivePlayers, RegistryError};

/// Server-wide set of active player names.
///
/// Cloning a `Registry` is cheap and every clone sees the same set.
/// All operations take the same lock, so they are linearized across
/// every match task no matter which runtime thread it runs on.
///
/// A `std` mutex (rather than an async one) is used because no critical
/// section awaits, and because [`Registration`] must be able to
/// unregister from a synchronous `Drop`.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<ActivePlayers>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks that `name` is free and claims it.
    ///
    /// The returned [`Registration`] releases the name when dropped, so
    /// the name is freed on every path out of a match: normal end,
    /// protocol error, disconnect, or panic.
    ///
    /// # Errors
    /// Returns [`RegistryError::AlreadyPlaying`] if the name is taken.
    pub fn register(&self, name: PlayerName) -> Result<Registration, RegistryError> {
        if !self.lock().try_register(&name) {
            tracing::info!(player = %name, "rejected duplicate player");
            return Err(RegistryError::AlreadyPlaying(name));
        }
        tracing::debug!(player = %name, "player registered");
        Ok(Registration {
            registry: self.clone(),
            name,
        })
    }

    /// Claims `name` without a guard. Returns `false` if it was taken.
    ///
    /// Prefer [`register`](Self::register); a name claimed this way stays
    /// active until [`unregister`](Self::unregister) is called.
    pub fn try_register(&self, name: &PlayerName) -> bool {
        self.lock().try_register(name)
    }

    /// Releases `name`. No-op if it isn't active.
    pub fn unregister(&self, name: &str) {
        self.lock().unregister(name);
    }

    /// Point-in-time membership check.
    ///
    /// Only useful for inspection: checking here and registering later is
    /// a race. Use [`register`](Self::register) to gate admission.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    /// Number of active names.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nobody is active.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, ActivePlayers> {
        // Every operation is a single set mutation, so a panic elsewhere
        // can't leave the set half-updated. Keep serving after poisoning.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that a name is active. Dropping it unregisters the name.
#[derive(Debug)]
pub struct Registration {
    registry: Registry,
    name: PlayerName,
}

impl Registration {
    /// The registered name.
    pub fn name(&self) -> &PlayerName {
        &self.name
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.name.as_str());
        tracing::debug!(player = %self.name, "player unregistered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s).unwrap()
    }

    #[test]
    fn test_register_then_duplicate_fails() {
        let registry = Registry::new();
        let _alice = registry.register(name("Alice")).expect("first succeeds");

        let err = registry.register(name("Alice")).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyPlaying(ref n) if n.as_str() == "Alice"));
        assert_eq!(err.fail_code().as_field(), "22 Already Playing");
    }

    #[test]
    fn test_dropping_registration_frees_name() {
        let registry = Registry::new();
        let alice = registry.register(name("Alice")).unwrap();
        assert!(registry.contains("Alice"));

        drop(alice);

        assert!(!registry.contains("Alice"));
        assert!(registry.register(name("Alice")).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = Registry::new();
        let other = registry.clone();
        let _bob = registry.register(name("Bob")).unwrap();
        assert!(other.contains("Bob"));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_raw_try_register_and_unregister() {
        let registry = Registry::new();
        assert!(registry.try_register(&name("Carol")));
        assert!(!registry.try_register(&name("Carol")));
        registry.unregister("Carol");
        registry.unregister("Carol");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registration_released_on_panic() {
        let registry = Registry::new();
        let inner = registry.clone();

        let result = std::thread::spawn(move || {
            let _guard = inner.register(name("Dave")).unwrap();
            panic!("match blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!registry.contains("Dave"));
    }
}
