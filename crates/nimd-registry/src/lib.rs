//! Active-player registry for nimd.
//!
//! A player name may be bound to at most one match at a time. This crate
//! enforces that across every concurrently running match:
//!
//! 1. **Set**: [`ActivePlayers`], the plain set of active names
//! 2. **Sharing**: [`Registry`], a cloneable handle that serializes all
//!    access behind one lock, making check-and-insert atomic
//! 3. **Cleanup**: [`Registration`], a guard that frees its name when
//!    dropped, whichever way its match ends
//!
//! # How it fits in the stack
//!
//! ```text
//! Matchmaker (above)  ← registers names as players OPEN
//!     ↕
//! Registry (this crate)  ← which names are in play right now
//!     ↕
//! Protocol (below)  ← provides PlayerName, FailCode
//! ```

mod active;
mod error;
mod registry;

pub use active::ActivePlayers;
pub use error::RegistryError;
pub use registry::{Registration, Registry};
