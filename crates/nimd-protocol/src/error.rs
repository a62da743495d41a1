//! Error types for the protocol layer.
//!
//! Each crate in nimd defines its own error enum. When you see a
//! `ProtocolError`, the problem is in how bytes were turned into a
//! message (or back), not in the game rules or the registry.

use nimd_transport::TransportError;

use crate::FailCode;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The bytes are not a well-formed message.
    ///
    /// Covers every structural or semantic violation the decoder finds:
    /// bad header, unknown keyword, wrong number of fields, a board slot
    /// outside `0..=9`, an illegal name, non-digit move fields, and so on.
    /// The string says which rule was broken, for logs only; the peer
    /// just sees `FAIL|10 Invalid|`.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The encoded content does not fit the two-digit length field.
    #[error("content is {0} bytes, the length field holds at most 99")]
    ContentTooLong(usize),

    /// The connection underneath failed while sending.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ProtocolError {
    /// Shorthand for building an [`InvalidFormat`](Self::InvalidFormat).
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidFormat(reason.into())
    }

    /// The `FAIL` code reported to a peer whose message caused this error.
    pub fn fail_code(&self) -> FailCode {
        FailCode::Invalid
    }
}
