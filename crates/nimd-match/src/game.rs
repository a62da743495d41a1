//! The rules of the game, free of any I/O.
//!
//! Two players alternate removing stones from one of five piles. Whoever
//! takes the last stone wins. The match engine feeds moves in and acts
//! on what comes out; everything here is plain data and deterministic.

use nimd_protocol::{Board, MoveRequest, PILES, PlayerNum};

use crate::MoveError;

/// What an accepted move led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// The turn passed to the other player.
    Continue,
    /// The mover emptied the board and wins.
    Won(PlayerNum),
}

/// Board plus whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NimGame {
    board: Board,
    current: PlayerNum,
}

impl NimGame {
    /// Starts a game from `board` with player 1 to move.
    pub fn new(board: Board) -> Self {
        Self {
            board,
            current: PlayerNum::One,
        }
    }

    /// The current board.
    pub fn board(&self) -> Board {
        self.board
    }

    /// The seat whose turn it is.
    pub fn current(&self) -> PlayerNum {
        self.current
    }

    /// Applies a move by the current player.
    ///
    /// On error nothing changes: same board, same player to move. After a
    /// winning move `current` still names the winner.
    pub fn apply_move(&mut self, request: MoveRequest) -> Result<MoveResult, MoveError> {
        let MoveRequest { pile, stones } = request;

        let index = usize::try_from(pile)
            .ok()
            .filter(|&i| i < PILES)
            .ok_or(MoveError::PileIndex(pile))?;
        let available = self.board.pile(index).unwrap_or_default();

        let quantity = MoveError::Quantity {
            pile,
            stones,
            available,
        };
        let take = u8::try_from(stones)
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| quantity.clone())?;
        self.board.take(index, take).ok_or(quantity)?;

        if self.board.is_empty() {
            return Ok(MoveResult::Won(self.current));
        }
        self.current = self.current.other();
        Ok(MoveResult::Continue)
    }
}
