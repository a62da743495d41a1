//! Error types for the client.

use nimd_protocol::ProtocolError;
use nimd_transport::TransportError;

/// Errors that end a client session early.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connecting to or talking with the server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message couldn't be encoded (for example, a name that breaks
    /// the wire format).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reading standard input failed.
    #[error("reading input failed: {0}")]
    Input(#[from] std::io::Error),
}
