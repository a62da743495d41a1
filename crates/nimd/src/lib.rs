//! # nimd
//!
//! A server for two-player Nim over TCP.
//!
//! Clients connect, name themselves with `OPEN`, and are paired in arrival
//! order. Each pair plays a game of five-pile Nim in its own task; whoever
//! takes the last stone wins, and a player who disconnects forfeits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nimd::prelude::*;
//!
//! # async fn start() -> Result<(), NimdError> {
//! let server = NimdServer::builder()
//!     .bind("0.0.0.0:7000")
//!     .build()
//!     .await?;
//! server.run().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod handshake;
mod server;

pub use error::NimdError;
pub use server::{NimdServer, NimdServerBuilder, ServerConfig};

/// Convenience re-exports for the common case.
pub mod prelude {
    pub use crate::{NimdError, NimdServer, NimdServerBuilder, ServerConfig};
    pub use nimd_match::{MatchConfig, Outcome};
    pub use nimd_protocol::{Board, FailCode, Message, PlayerName, PlayerNum};
    pub use nimd_registry::Registry;
}
