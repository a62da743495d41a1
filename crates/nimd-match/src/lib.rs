//! Nim rules and the match engine for nimd.
//!
//! Each match runs as its own Tokio task that owns both players'
//! connections and both name registrations until the game ends.
//!
//! # Key types
//!
//! - [`NimGame`]: board, turn order, and move validation (no I/O)
//! - [`Match`]: drives one game over two connections
//! - [`MatchState`] / [`Outcome`]: where a match is and how it ended
//! - [`MatchConfig`]: settings applied to every match

mod config;
mod engine;
mod error;
mod game;

pub use config::{MatchConfig, MatchState, Outcome};
pub use engine::{Match, MatchId, Seat};
pub use error::{MatchError, MoveError};
pub use game::{MoveResult, NimGame};
