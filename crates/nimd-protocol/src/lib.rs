//! Wire protocol for nimd.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Message`], [`Board`], [`PlayerName`], [`FailCode`], etc.):
//!   the messages and the fields they carry.
//! - **Codec** ([`encode`], [`decode`], [`decode_move`]): how one message
//!   is turned into a frame and back.
//! - **Framing** ([`FrameBuffer`], [`Peer`]): how frames are recovered
//!   from a byte stream that doesn't preserve message boundaries.
//! - **Errors** ([`ProtocolError`]): what can go wrong on the way.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the game
//! (player identity, match rules). It doesn't know about registries or
//! matches; it only knows what a valid message looks like.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Registry / Match
//! ```

mod codec;
mod error;
mod peer;
mod types;

pub use codec::{
    FrameBuffer, MAX_CONTENT_LEN, PROTOCOL_VERSION, decode, decode_move, encode,
};
pub use error::ProtocolError;
pub use peer::{Peer, REASSEMBLY_WINDOW};
pub use types::{
    Board, FailCode, MAX_NAME_LEN, MAX_PILE, Message, MoveRequest, OverReason,
    PILES, PlayerName, PlayerNum,
};
