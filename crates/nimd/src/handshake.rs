//! The `OPEN` handshake: the first frame of every connection.
//!
//! A client gets a seat only after it names itself with `OPEN` and the
//! name is claimed in the registry. Every other outcome closes the
//! connection, with a `FAIL` explaining why when there is anything to
//! explain.

use std::time::Duration;

use nimd_match::Seat;
use nimd_protocol::{FailCode, Message, Peer, ProtocolError, decode};
use nimd_registry::Registry;
use nimd_transport::{Connection, TransportError};

use crate::NimdError;

/// Reads one `OPEN` from `peer` and registers its name.
///
/// On success the returned [`Seat`] holds the name until it is dropped.
///
/// # Errors
/// - [`NimdError::Transport`] if the connection closed or failed before
///   a complete frame arrived. Nothing is sent back.
/// - [`NimdError::Protocol`] if the frame wasn't a valid `OPEN`, or the
///   client took longer than `timeout`. The client gets `FAIL|10 Invalid|`.
/// - [`NimdError::Registry`] if the name is already active. The client
///   gets `FAIL|22 Already Playing|`.
pub(crate) async fn perform_open<C>(
    mut peer: Peer<C>,
    registry: &Registry,
    timeout: Option<Duration>,
) -> Result<Seat<C>, NimdError>
where
    C: Connection<Error = TransportError>,
{
    let conn_id = peer.id();

    let received = match timeout {
        Some(limit) => tokio::time::timeout(limit, peer.recv_frame()).await.ok(),
        None => Some(peer.recv_frame().await),
    };
    let Some(received) = received else {
        tracing::debug!(%conn_id, "handshake timed out");
        let err = ProtocolError::InvalidFormat("handshake timed out".into());
        return Err(reject(peer, err.fail_code(), err.into()).await);
    };

    let frame = match received {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            peer.close().await;
            return Err(TransportError::ConnectionClosed(format!(
                "{conn_id} closed before OPEN"
            ))
            .into());
        }
        Err(e) => {
            peer.close().await;
            return Err(e.into());
        }
    };

    let name = match decode(&frame) {
        Ok(Message::Open { name }) => name,
        Ok(other) => {
            let err = ProtocolError::InvalidFormat(format!(
                "expected OPEN, got {}",
                other.keyword()
            ));
            return Err(reject(peer, err.fail_code(), err.into()).await);
        }
        Err(e) => return Err(reject(peer, e.fail_code(), e.into()).await),
    };

    match registry.register(name) {
        Ok(registration) => {
            tracing::info!(%conn_id, player = %registration.name(), "player opened");
            Ok(Seat { peer, registration })
        }
        Err(e) => Err(reject(peer, e.fail_code(), e.into()).await),
    }
}

/// Sends `FAIL` with `code`, closes the connection, and hands back `err`.
async fn reject<C>(peer: Peer<C>, code: FailCode, err: NimdError) -> NimdError
where
    C: Connection<Error = TransportError>,
{
    if let Err(e) = peer.send(&Message::Fail(code)).await {
        tracing::debug!(conn_id = %peer.id(), error = %e, "failed to send FAIL");
    }
    peer.close().await;
    err
}
