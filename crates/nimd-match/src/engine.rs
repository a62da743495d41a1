//! The match engine: one task per game, owning both players' connections.
//!
//! The engine sends `PLAY`, then waits on *both* sockets at once. That
//! lets it answer an out-of-turn message the moment it arrives, and
//! notice either player leaving without waiting for the other to move.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nimd_protocol::{FailCode, Message, OverReason, Peer, PlayerName, PlayerNum, decode_move};
use nimd_registry::Registration;
use nimd_transport::{Connection, TransportError};

use crate::{MatchConfig, MatchState, MoveResult, NimGame, Outcome};

/// Counter for generating unique match IDs.
static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one match in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchId(u64);

impl MatchId {
    /// Allocates the next process-unique ID.
    pub fn next() -> Self {
        Self(NEXT_MATCH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// One seat at the table: the connection and the name it holds.
pub struct Seat<C: Connection<Error = TransportError>> {
    pub peer: Peer<C>,
    pub registration: Registration,
}

/// Who a message goes to.
#[derive(Debug, Clone, Copy)]
enum Recipient {
    Both,
    Player(PlayerNum),
}

/// The last word of a finished match.
struct Ending {
    outcome: Outcome,
    notice: Option<(Recipient, Message)>,
}

/// A running game between two registered players.
///
/// The match exclusively owns both connections and both registrations.
/// They are all released when [`run`](Self::run) returns, or when the
/// match is dropped if its task dies first.
pub struct Match<C: Connection<Error = TransportError>> {
    id: MatchId,
    peers: [Peer<C>; 2],
    names: [PlayerName; 2],
    registrations: Vec<Registration>,
    game: NimGame,
    state: MatchState,
}

impl<C: Connection<Error = TransportError>> Match<C> {
    /// Seats player 1 and player 2 at a fresh board.
    pub fn new(id: MatchId, one: Seat<C>, two: Seat<C>, config: &MatchConfig) -> Self {
        let names = [
            one.registration.name().clone(),
            two.registration.name().clone(),
        ];
        Self {
            id,
            peers: [one.peer, two.peer],
            names,
            registrations: vec![one.registration, two.registration],
            game: NimGame::new(config.initial_board),
            state: MatchState::AwaitingMove(PlayerNum::One),
        }
    }

    /// The match's ID.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Where the match is in its lifecycle.
    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Plays the match to the end and returns how it ended.
    pub async fn run(mut self) -> Outcome {
        tracing::info!(
            match_id = %self.id,
            player1 = %self.names[0],
            player2 = %self.names[1],
            "match started"
        );

        self.introduce().await;

        let ending = loop {
            let current = self.game.current();
            self.state = MatchState::AwaitingMove(current);
            self.broadcast(&Message::Play {
                player: current,
                board: self.game.board(),
            })
            .await;

            if let Some(ending) = self.play_turn(current).await {
                break ending;
            }
        };

        self.finish(ending).await
    }

    /// Tells each player their seat and their opponent's name.
    async fn introduce(&self) {
        for seat in [PlayerNum::One, PlayerNum::Two] {
            let msg = Message::Name {
                player: seat,
                opponent: self.names[seat.other().index()].clone(),
            };
            self.send_to(seat, &msg).await;
        }
    }

    /// Waits for the current player's move.
    ///
    /// Returns `None` when the turn should start over with a fresh `PLAY`
    /// (the move was applied, or rejected as out of range), and
    /// `Some(ending)` when the match is over.
    async fn play_turn(&mut self, current: PlayerNum) -> Option<Ending> {
        loop {
            let (from, frame) = self.recv_either(current).await;

            let Some(frame) = frame else {
                // Whoever left, the one still here wins.
                let winner = from.other();
                tracing::info!(
                    match_id = %self.id,
                    player = %self.names[from.index()],
                    "player disconnected, {} wins by forfeit",
                    self.names[winner.index()]
                );
                return Some(Ending {
                    outcome: Outcome::Forfeit(winner),
                    notice: Some((
                        Recipient::Player(winner),
                        Message::Over {
                            winner,
                            board: self.game.board(),
                            reason: OverReason::Forfeit,
                        },
                    )),
                });
            };

            if from != current {
                tracing::debug!(
                    match_id = %self.id,
                    player = %self.names[from.index()],
                    "message out of turn"
                );
                self.send_to(from, &Message::Fail(FailCode::Impatient)).await;
                // Same turn, no fresh PLAY.
                continue;
            }

            let request = match decode_move(&frame) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(
                        match_id = %self.id,
                        player = %self.names[current.index()],
                        error = %e,
                        "invalid message, aborting match"
                    );
                    return Some(Ending {
                        outcome: Outcome::Aborted,
                        notice: Some((
                            Recipient::Player(current),
                            Message::Fail(e.fail_code()),
                        )),
                    });
                }
            };

            return match self.game.apply_move(request) {
                Ok(MoveResult::Continue) => {
                    tracing::info!(
                        match_id = %self.id,
                        player = %current,
                        pile = request.pile,
                        stones = request.stones,
                        board = %self.game.board(),
                        "move accepted"
                    );
                    None
                }
                Ok(MoveResult::Won(winner)) => {
                    tracing::info!(
                        match_id = %self.id,
                        player = %self.names[winner.index()],
                        "took the last stone"
                    );
                    Some(Ending {
                        outcome: Outcome::Win(winner),
                        notice: Some((
                            Recipient::Both,
                            Message::Over {
                                winner,
                                board: self.game.board(),
                                reason: OverReason::Normal,
                            },
                        )),
                    })
                }
                Err(e) => {
                    tracing::debug!(
                        match_id = %self.id,
                        player = %current,
                        error = %e,
                        "move rejected"
                    );
                    self.send_to(current, &Message::Fail(e.fail_code())).await;
                    None
                }
            };
        }
    }

    /// Waits until either player sends a frame or disconnects.
    ///
    /// The waiting player is polled first, so a simultaneous out-of-turn
    /// message is always noticed. `None` means that player's stream is
    /// closed (or broken).
    async fn recv_either(&mut self, current: PlayerNum) -> (PlayerNum, Option<Vec<u8>>) {
        let [one, two] = &mut self.peers;
        let (mover, waiter) = match current {
            PlayerNum::One => (one, two),
            PlayerNum::Two => (two, one),
        };

        let (from, result) = tokio::select! {
            biased;
            result = waiter.recv_frame() => (current.other(), result),
            result = mover.recv_frame() => (current, result),
        };

        let frame = result.unwrap_or_else(|e| {
            tracing::debug!(match_id = %self.id, player = %from, error = %e, "receive failed");
            None
        });
        (from, frame)
    }

    /// Frees both names, delivers the final message, and hangs up.
    ///
    /// Names are freed before anyone hears the match is over, so a player
    /// who reconnects right after `OVER` is never told they're still
    /// playing.
    async fn finish(mut self, ending: Ending) -> Outcome {
        self.state = MatchState::Finished(ending.outcome);
        self.registrations.clear();

        if let Some((recipient, msg)) = &ending.notice {
            self.dispatch(*recipient, msg).await;
        }
        for peer in &self.peers {
            peer.close().await;
        }

        tracing::info!(match_id = %self.id, outcome = %ending.outcome, "match finished");
        ending.outcome
    }

    async fn dispatch(&self, recipient: Recipient, msg: &Message) {
        match recipient {
            Recipient::Both => self.broadcast(msg).await,
            Recipient::Player(seat) => self.send_to(seat, msg).await,
        }
    }

    async fn broadcast(&self, msg: &Message) {
        for seat in [PlayerNum::One, PlayerNum::Two] {
            self.send_to(seat, msg).await;
        }
    }

    /// Sends to one player. A failed send is only logged: if the player is
    /// really gone, the next read on their socket ends the match.
    async fn send_to(&self, seat: PlayerNum, msg: &Message) {
        if let Err(e) = self.peers[seat.index()].send(msg).await {
            tracing::debug!(
                match_id = %self.id,
                player = %seat,
                error = %e,
                "send failed"
            );
        }
    }
}
