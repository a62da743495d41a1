//! Unified error type for the nimd server.

use nimd_match::MatchError;
use nimd_protocol::ProtocolError;
use nimd_registry::RegistryError;
use nimd_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NimdError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed frame, wrong message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry error (name already in play).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A match configuration error.
    #[error(transparent)]
    Match(#[from] MatchError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimd_protocol::PlayerName;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let nimd_err: NimdError = err.into();
        assert!(matches!(nimd_err, NimdError::Transport(_)));
        assert!(nimd_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::ContentTooLong(120);
        let nimd_err: NimdError = err.into();
        assert!(matches!(nimd_err, NimdError::Protocol(_)));
    }

    #[test]
    fn test_from_registry_error() {
        let err = RegistryError::AlreadyPlaying(PlayerName::new("Alice").unwrap());
        let nimd_err: NimdError = err.into();
        assert!(matches!(nimd_err, NimdError::Registry(_)));
        assert!(nimd_err.to_string().contains("Alice"));
    }

    #[test]
    fn test_from_match_error() {
        let nimd_err: NimdError = MatchError::EmptyBoard.into();
        assert!(matches!(nimd_err, NimdError::Match(_)));
    }
}
