//! Turning server messages into lines for the terminal.

use nimd_protocol::{Message, MoveRequest, OverReason, PlayerNum};

/// How a game ended, from this client's side of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// We won; `forfeit` if the opponent left.
    Won { forfeit: bool },
    /// We lost; `forfeit` if the win was awarded because we were gone.
    Lost { forfeit: bool },
    /// The server hung up without an `OVER`.
    ServerClosed,
    /// Standard input ran out.
    InputClosed,
}

/// What the client knows about its own game.
#[derive(Debug, Default)]
pub struct GameView {
    me: Option<PlayerNum>,
}

impl GameView {
    /// A view that doesn't know its seat yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Our seat, once the server has told us.
    pub fn player(&self) -> Option<PlayerNum> {
        self.me
    }

    /// Describes `msg` for the player. Returns the text to print and, for
    /// `OVER`, how the game ended.
    pub fn describe(&mut self, msg: &Message) -> (String, Option<Finish>) {
        match msg {
            Message::Wait => ("Waiting for an opponent...".to_string(), None),
            Message::Name { player, opponent } => {
                self.me = Some(*player);
                (format!("You are player {player}, opponent: {opponent}"), None)
            }
            Message::Play { player, board } => {
                let prompt = if Some(*player) == self.me {
                    "Your turn! Enter a move as 'pile stones' (e.g. '2 3')."
                } else {
                    "Waiting for the opponent's move..."
                };
                (format!("Board: {board}\n{prompt}"), None)
            }
            Message::Over {
                winner,
                board,
                reason,
            } => {
                let forfeit = *reason == OverReason::Forfeit;
                let finish = if Some(*winner) == self.me {
                    Finish::Won { forfeit }
                } else {
                    Finish::Lost { forfeit }
                };
                let text = match finish {
                    Finish::Won { forfeit: true } => "You win! (opponent forfeited)",
                    Finish::Won { .. } => "You win!",
                    Finish::Lost { forfeit: true } => "You lose. (you forfeited)",
                    _ => "You lose.",
                };
                (format!("Board: {board}\n{text}"), Some(finish))
            }
            Message::Fail(code) => (format!("Server rejected that: {code}"), None),
            // Client-to-server messages; the server never sends these.
            Message::Open { .. } | Message::Move(_) => {
                (format!("Unexpected {} from server", msg.keyword()), None)
            }
        }
    }
}

/// Parses a `"pile stones"` line typed by the player.
///
/// Range checks are left to the server, which answers with the right
/// `FAIL` code.
pub fn parse_move(line: &str) -> Option<MoveRequest> {
    let mut parts = line.split_whitespace();
    let pile = parts.next()?.parse().ok()?;
    let stones = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(MoveRequest { pile, stones })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimd_protocol::{Board, FailCode, PlayerName};

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    fn seated(player: PlayerNum) -> GameView {
        let mut view = GameView::new();
        view.describe(&Message::Name {
            player,
            opponent: PlayerName::new("Bob").unwrap(),
        });
        view
    }

    #[test]
    fn test_name_sets_seat() {
        let mut view = GameView::new();
        assert_eq!(view.player(), None);
        let (text, finish) = view.describe(&Message::Name {
            player: PlayerNum::Two,
            opponent: PlayerName::new("Alice").unwrap(),
        });
        assert_eq!(view.player(), Some(PlayerNum::Two));
        assert_eq!(text, "You are player 2, opponent: Alice");
        assert_eq!(finish, None);
    }

    #[test]
    fn test_play_prompts_only_on_our_turn() {
        let mut view = seated(PlayerNum::One);

        let (mine, _) = view.describe(&Message::Play {
            player: PlayerNum::One,
            board: Board::INITIAL,
        });
        assert!(mine.starts_with("Board: 1 3 5 7 9"));
        assert!(mine.contains("Your turn"));

        let (theirs, _) = view.describe(&Message::Play {
            player: PlayerNum::Two,
            board: Board::INITIAL,
        });
        assert!(theirs.contains("opponent's move"));
    }

    #[test]
    fn test_over_reports_result() {
        let over = |winner, reason| Message::Over {
            winner,
            board: board("0 0 0 0 0"),
            reason,
        };

        let mut view = seated(PlayerNum::One);
        let (text, finish) = view.describe(&over(PlayerNum::One, OverReason::Normal));
        assert!(text.ends_with("You win!"));
        assert_eq!(finish, Some(Finish::Won { forfeit: false }));

        let (text, finish) = view.describe(&over(PlayerNum::One, OverReason::Forfeit));
        assert!(text.contains("forfeited"));
        assert_eq!(finish, Some(Finish::Won { forfeit: true }));

        let (text, finish) = view.describe(&over(PlayerNum::Two, OverReason::Normal));
        assert!(text.ends_with("You lose."));
        assert_eq!(finish, Some(Finish::Lost { forfeit: false }));

        let (text, finish) = view.describe(&over(PlayerNum::Two, OverReason::Forfeit));
        assert!(text.ends_with("You lose. (you forfeited)"));
        assert_eq!(finish, Some(Finish::Lost { forfeit: true }));
    }

    #[test]
    fn test_fail_is_shown() {
        let mut view = seated(PlayerNum::One);
        let (text, finish) = view.describe(&Message::Fail(FailCode::Impatient));
        assert_eq!(text, "Server rejected that: 31 Impatient");
        assert_eq!(finish, None);
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            parse_move("2 3"),
            Some(MoveRequest { pile: 2, stones: 3 })
        );
        assert_eq!(
            parse_move("  4\t9 \n"),
            Some(MoveRequest { pile: 4, stones: 9 })
        );
        // Out of range is still a move; the server judges it.
        assert_eq!(
            parse_move("7 0"),
            Some(MoveRequest { pile: 7, stones: 0 })
        );
        assert_eq!(parse_move(""), None);
        assert_eq!(parse_move("2"), None);
        assert_eq!(parse_move("2 3 4"), None);
        assert_eq!(parse_move("two 3"), None);
        assert_eq!(parse_move("-1 3"), None);
    }
}
