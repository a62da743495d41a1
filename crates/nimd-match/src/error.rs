//! Error types for the match layer.

use nimd_protocol::FailCode;

/// A move the rules don't allow. The board is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// There is no pile with this index.
    #[error("pile {0} does not exist")]
    PileIndex(u32),

    /// Zero stones, or more stones than the pile holds.
    #[error("cannot take {stones} stone(s) from pile {pile} holding {available}")]
    Quantity { pile: u32, stones: u32, available: u8 },
}

impl MoveError {
    /// The `FAIL` code reported to the player who made the move.
    pub fn fail_code(&self) -> FailCode {
        match self {
            Self::PileIndex(_) => FailCode::PileIndex,
            Self::Quantity { .. } => FailCode::Quantity,
        }
    }
}

/// Errors setting up matches.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The configured starting board has no stones, so no move could
    /// ever be legal.
    #[error("initial board has no stones")]
    EmptyBoard,
}
