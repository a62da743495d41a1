//! One client session: connect, `OPEN`, then relay until the game ends.

use nimd_protocol::{Message, Peer, PlayerName, decode};
use nimd_transport::TcpConnection;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{ClientError, Finish, GameView, parse_move};

/// Connects to `addr` and asks to play as `name`.
pub async fn open(addr: &str, name: PlayerName) -> Result<Peer<TcpConnection>, ClientError> {
    let peer = Peer::new(TcpConnection::connect(addr).await?);
    peer.send(&Message::Open { name }).await?;
    Ok(peer)
}

/// Plays one game, reading moves from `input` and printing every server
/// message to stdout.
///
/// Returns when the game is over, the server hangs up, or `input` runs
/// out.
pub async fn play<R>(mut peer: Peer<TcpConnection>, input: R) -> Result<Finish, ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut view = GameView::new();
    let mut lines = input.lines();

    let finish = loop {
        tokio::select! {
            frame = peer.recv_frame() => {
                let Some(frame) = frame? else {
                    println!("Server disconnected.");
                    break Finish::ServerClosed;
                };
                match decode(&frame) {
                    Ok(msg) => {
                        let (text, finish) = view.describe(&msg);
                        println!("{text}");
                        if let Some(finish) = finish {
                            break finish;
                        }
                    }
                    Err(e) => tracing::warn!(
                        error = %e,
                        frame = %String::from_utf8_lossy(&frame),
                        "unreadable message from server"
                    ),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break Finish::InputClosed;
                };
                match parse_move(&line) {
                    Some(request) => peer.send(&Message::Move(request)).await?,
                    None => println!("Enter a move as 'pile stones' (e.g. '2 3')."),
                }
            }
        }
    };

    peer.close().await;
    Ok(finish)
}

