//! A connection that speaks whole protocol messages.

use std::time::Duration;

use nimd_transport::{Connection, ConnectionId, TransportError};
use tokio::time::Instant;

use crate::{FrameBuffer, Message, ProtocolError, encode};

/// How long the rest of a partly received frame may take to arrive.
///
/// TCP may split one message across reads, so a short gap is waited out.
/// A frame still incomplete after this window (say, a header whose length
/// overstates its content) is handed on as it is, and decoding rejects it.
pub const REASSEMBLY_WINDOW: Duration = Duration::from_millis(200);

/// One connected client: its [`Connection`] plus the buffer that
/// reassembles frames from it.
///
/// Sending takes `&self`; receiving needs `&mut self` because it drains
/// the frame buffer. Two `Peer`s can be read concurrently (e.g. inside a
/// `tokio::select!`) since `recv_frame` is cancel-safe.
pub struct Peer<C: Connection<Error = TransportError>> {
    conn: C,
    frames: FrameBuffer,
    window: Duration,
    /// When the partial frame now buffered must be given up on.
    deadline: Option<Instant>,
}

impl<C: Connection<Error = TransportError>> Peer<C> {
    /// Wraps a freshly accepted connection.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            frames: FrameBuffer::new(),
            window: REASSEMBLY_WINDOW,
            deadline: None,
        }
    }

    /// Overrides [`REASSEMBLY_WINDOW`] for this peer.
    pub fn with_reassembly_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Returns the underlying connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Encodes and sends one message.
    pub async fn send(&self, msg: &Message) -> Result<(), ProtocolError> {
        let bytes = encode(msg)?;
        tracing::debug!(
            conn_id = %self.conn.id(),
            frame = %String::from_utf8_lossy(&bytes),
            "send"
        );
        self.conn.send(&bytes).await?;
        Ok(())
    }

    /// Waits for the next frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream. Bytes of an
    /// unfinished frame left behind at that point are discarded. A frame
    /// that stays unfinished for the reassembly window is returned as
    /// received, so a bad length field is answered instead of waited on.
    ///
    /// Cancel-safe: received bytes are moved into the frame buffer only
    /// after the underlying read completes, and the reassembly deadline
    /// survives a dropped call, so dropping this future loses nothing.
    pub async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            if let Some(frame) = self.frames.next_frame() {
                self.deadline = None;
                tracing::debug!(
                    conn_id = %self.conn.id(),
                    frame = %String::from_utf8_lossy(&frame),
                    "recv"
                );
                return Ok(Some(frame));
            }

            let received = if self.frames.is_empty() {
                self.deadline = None;
                self.conn.recv().await?
            } else {
                let window = self.window;
                let deadline = *self.deadline.get_or_insert_with(|| Instant::now() + window);
                match tokio::time::timeout_at(deadline, self.conn.recv()).await {
                    Ok(received) => received?,
                    Err(_) => {
                        self.deadline = None;
                        let frame = self.frames.flush();
                        tracing::debug!(
                            conn_id = %self.conn.id(),
                            frame = %String::from_utf8_lossy(&frame),
                            "incomplete frame"
                        );
                        return Ok(Some(frame));
                    }
                }
            };

            match received {
                Some(bytes) => self.frames.extend(&bytes),
                None => return Ok(None),
            }
        }
    }

    /// Closes the connection, ignoring errors from a peer that is
    /// already gone.
    pub async fn close(&self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(conn_id = %self.conn.id(), error = %e, "close failed");
        }
    }
}
