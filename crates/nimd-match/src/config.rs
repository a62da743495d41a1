//! Match configuration and lifecycle state.

use std::fmt;

use nimd_protocol::{Board, PlayerNum};
use serde::{Deserialize, Serialize};

use crate::MatchError;

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Configuration applied to every match the server starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// The board each game starts from.
    pub initial_board: Board,
}

impl MatchConfig {
    /// Rejects configurations a game could never be played from.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.initial_board.is_empty() {
            return Err(MatchError::EmptyBoard);
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            initial_board: Board::INITIAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome / MatchState
// ---------------------------------------------------------------------------

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The player took the last stone.
    Win(PlayerNum),
    /// The player won because the opponent disconnected.
    Forfeit(PlayerNum),
    /// The player whose turn it was sent something that wasn't a `MOVE`.
    Aborted,
}

impl Outcome {
    /// The winning seat, if the match had a winner.
    pub fn winner(&self) -> Option<PlayerNum> {
        match self {
            Self::Win(p) | Self::Forfeit(p) => Some(*p),
            Self::Aborted => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win(p) => write!(f, "player {p} wins"),
            Self::Forfeit(p) => write!(f, "player {p} wins by forfeit"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Where a match is in its lifecycle.
///
/// ```text
/// AwaitingMove(1) ⇄ AwaitingMove(2) → Finished(outcome)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    /// Waiting for the given seat to move.
    AwaitingMove(PlayerNum),
    /// The match is over.
    Finished(Outcome),
}

impl MatchState {
    /// Returns `true` once the match has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingMove(p) => write!(f, "AwaitingMove({p})"),
            Self::Finished(outcome) => write!(f, "Finished({outcome})"),
        }
    }
}
