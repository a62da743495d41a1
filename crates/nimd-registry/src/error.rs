//! Error types for the registry layer.

use nimd_protocol::{FailCode, PlayerName};

/// Errors that can occur when registering a player.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The name is already bound to a live match (or a player waiting
    /// for one). A name can only be active once at a time.
    #[error("player {0} is already playing")]
    AlreadyPlaying(PlayerName),
}

impl RegistryError {
    /// The `FAIL` code reported to the rejected client.
    pub fn fail_code(&self) -> FailCode {
        match self {
            Self::AlreadyPlaying(_) => FailCode::AlreadyPlaying,
        }
    }
}
