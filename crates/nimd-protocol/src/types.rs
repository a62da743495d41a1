//! Core protocol types for the nimd wire format.
//!
//! Every type here is something that travels "on the wire": it is
//! rendered into a `|`-delimited field by the encoder and parsed back by
//! the decoder. Types that carry constraints (names, boards) can only be
//! constructed through validating constructors, so a `Message` that
//! exists is always one the encoder can render.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Longest player name the protocol accepts, in bytes.
pub const MAX_NAME_LEN: usize = 72;

/// Number of piles on a board.
pub const PILES: usize = 5;

/// Largest value a single pile may hold on the wire.
pub const MAX_PILE: u8 = 9;

// ---------------------------------------------------------------------------
// PlayerNum
// ---------------------------------------------------------------------------

/// Which seat a player occupies in a match.
///
/// The first player the matchmaker accepts is `One` and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerNum {
    One,
    Two,
}

impl PlayerNum {
    /// Returns the opponent's seat.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Zero-based index, handy for two-element arrays.
    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

impl fmt::Display for PlayerNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Two => write!(f, "2"),
        }
    }
}

impl FromStr for PlayerNum {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            other => Err(ProtocolError::invalid(format!(
                "player number must be 1 or 2, got {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerName
// ---------------------------------------------------------------------------

/// A player's identity: at most 72 bytes, non-empty, no `|`.
///
/// An empty name could never be read back, because the field splitter
/// would see nothing between two pipes, so it is rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// Validates and wraps a name.
    pub fn new(name: impl Into<String>) -> Result<Self, ProtocolError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProtocolError::invalid("player name is empty"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ProtocolError::invalid(format!(
                "player name is {} bytes, limit is {MAX_NAME_LEN}",
                name.len()
            )));
        }
        if name.contains('|') {
            return Err(ProtocolError::invalid("player name contains '|'"));
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PlayerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Five pile counts, rendered on the wire as `"b0 b1 b2 b3 b4"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; 5]", into = "[u8; 5]")]
pub struct Board([u8; PILES]);

impl Board {
    /// The board every game starts from.
    pub const INITIAL: Board = Board([1, 3, 5, 7, 9]);

    /// Builds a board, rejecting any pile above 9.
    pub fn new(piles: [u8; PILES]) -> Result<Self, ProtocolError> {
        if let Some(bad) = piles.iter().find(|&&p| p > MAX_PILE) {
            return Err(ProtocolError::invalid(format!(
                "board slot {bad} is outside 0..={MAX_PILE}"
            )));
        }
        Ok(Self(piles))
    }

    /// Returns the stones in pile `index`, or `None` if there is no such pile.
    pub fn pile(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Returns all pile counts.
    pub fn piles(&self) -> [u8; PILES] {
        self.0
    }

    /// Removes `stones` from pile `index`.
    ///
    /// Returns the stones left in that pile, or `None` (board unchanged)
    /// if the pile doesn't exist or holds fewer than `stones`.
    pub fn take(&mut self, index: usize, stones: u8) -> Option<u8> {
        let pile = self.0.get_mut(index)?;
        let left = pile.checked_sub(stones)?;
        *pile = left;
        Some(left)
    }

    /// Returns `true` once every stone has been taken.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&p| p == 0)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e] = self.0;
        write!(f, "{a} {b} {c} {d} {e}")
    }
}

impl FromStr for Board {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut piles = [0u8; PILES];
        let mut slots = s.split(' ');
        for pile in piles.iter_mut() {
            let slot = slots.next().ok_or_else(|| {
                ProtocolError::invalid(format!("board {s:?} has fewer than {PILES} slots"))
            })?;
            *pile = parse_digits(slot)
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| {
                    ProtocolError::invalid(format!("board slot {slot:?} is not a number"))
                })?;
        }
        if slots.next().is_some() {
            return Err(ProtocolError::invalid(format!(
                "board {s:?} has more than {PILES} slots"
            )));
        }
        Self::new(piles)
    }
}

impl TryFrom<[u8; PILES]> for Board {
    type Error = ProtocolError;

    fn try_from(piles: [u8; PILES]) -> Result<Self, Self::Error> {
        Self::new(piles)
    }
}

impl From<Board> for [u8; PILES] {
    fn from(board: Board) -> Self {
        board.0
    }
}

/// Parses a non-empty run of ASCII digits. Signs, spaces, and overflow
/// are all rejected.
pub(crate) fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ---------------------------------------------------------------------------
// OverReason
// ---------------------------------------------------------------------------

/// Why a game ended, as carried in the last field of `OVER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverReason {
    /// The winner took the last stone. Encoded as an empty field.
    Normal,
    /// The opponent disconnected.
    Forfeit,
}

impl OverReason {
    fn as_field(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Forfeit => "Forfeit",
        }
    }
}

impl FromStr for OverReason {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::Normal),
            "Forfeit" => Ok(Self::Forfeit),
            other => Err(ProtocolError::invalid(format!(
                "OVER reason must be empty or Forfeit, got {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// FailCode
// ---------------------------------------------------------------------------

/// The combined code-and-text field of a `FAIL` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailCode {
    /// `10 Invalid`: malformed or unexpected message.
    Invalid,
    /// `22 Already Playing`: the name is bound to a live match.
    AlreadyPlaying,
    /// `31 Impatient`: the player moved out of turn.
    Impatient,
    /// `32 Pile Index`: no such pile.
    PileIndex,
    /// `33 Quantity`: zero stones, or more than the pile holds.
    Quantity,
    /// Any other well-formed field, kept verbatim so it round-trips.
    Other(String),
}

impl FailCode {
    /// Wraps an arbitrary failure field. It must be non-empty and free of `|`.
    pub fn other(field: impl Into<String>) -> Result<Self, ProtocolError> {
        let field = field.into();
        if field.is_empty() || field.contains('|') {
            return Err(ProtocolError::invalid(format!(
                "FAIL field {field:?} must be non-empty and contain no '|'"
            )));
        }
        Ok(Self::from_field(&field))
    }

    fn from_field(field: &str) -> Self {
        match field {
            "10 Invalid" => Self::Invalid,
            "22 Already Playing" => Self::AlreadyPlaying,
            "31 Impatient" => Self::Impatient,
            "32 Pile Index" => Self::PileIndex,
            "33 Quantity" => Self::Quantity,
            other => Self::Other(other.to_string()),
        }
    }

    /// The text exactly as it appears on the wire.
    pub fn as_field(&self) -> &str {
        match self {
            Self::Invalid => "10 Invalid",
            Self::AlreadyPlaying => "22 Already Playing",
            Self::Impatient => "31 Impatient",
            Self::PileIndex => "32 Pile Index",
            Self::Quantity => "33 Quantity",
            Self::Other(field) => field,
        }
    }
}

impl fmt::Display for FailCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_field())
    }
}

impl FromStr for FailCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::other(s)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The pile and stone count of a `MOVE`, before any range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub pile: u32,
    pub stones: u32,
}

/// One protocol message. The variant is the keyword; the fields follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Client → server: join with this name.
    Open { name: PlayerName },
    /// Server → client: you're queued, waiting for an opponent.
    Wait,
    /// Server → client: your seat and your opponent's name.
    Name {
        player: PlayerNum,
        opponent: PlayerName,
    },
    /// Server → both: whose turn it is and the current board.
    Play { player: PlayerNum, board: Board },
    /// Client → server: take stones from a pile.
    Move(MoveRequest),
    /// Server → client(s): the game ended.
    Over {
        winner: PlayerNum,
        board: Board,
        reason: OverReason,
    },
    /// Server → client: the last action was rejected.
    Fail(FailCode),
}

impl Message {
    /// The keyword this message is introduced by on the wire.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Open { .. } => "OPEN",
            Self::Wait => "WAIT",
            Self::Name { .. } => "NAME",
            Self::Play { .. } => "PLAY",
            Self::Move(_) => "MOVE",
            Self::Over { .. } => "OVER",
            Self::Fail(_) => "FAIL",
        }
    }

    /// The fields that follow the keyword, in wire order.
    pub(crate) fn fields(&self) -> Vec<String> {
        match self {
            Self::Open { name } => vec![name.to_string()],
            Self::Wait => Vec::new(),
            Self::Name { player, opponent } => {
                vec![player.to_string(), opponent.to_string()]
            }
            Self::Play { player, board } => {
                vec![player.to_string(), board.to_string()]
            }
            Self::Move(MoveRequest { pile, stones }) => {
                vec![pile.to_string(), stones.to_string()]
            }
            Self::Over {
                winner,
                board,
                reason,
            } => vec![
                winner.to_string(),
                board.to_string(),
                reason.as_field().to_string(),
            ],
            Self::Fail(code) => vec![code.as_field().to_string()],
        }
    }
}
