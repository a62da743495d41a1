//! Reference terminal client for nimd.
//!
//! Connects, names the player with `OPEN`, then relays between the
//! terminal and the server: every server message is printed, and each
//! `"pile stones"` line typed becomes a `MOVE`.

mod error;
mod session;
mod view;

pub use error::ClientError;
pub use session::{open, play};
pub use view::{Finish, GameView, parse_move};
