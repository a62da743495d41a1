//! `NimdServer` builder and the matchmaking loop.
//!
//! This is the entry point for running a nimd server. It ties together
//! all the layers: transport → protocol → registry → match.

use std::time::Duration;

use nimd_match::{Match, MatchConfig, MatchId, Outcome, Seat};
use nimd_protocol::{Message, Peer};
use nimd_registry::Registry;
use nimd_transport::{Connection, TcpConnection, TcpTransport, Transport};
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinSet};

use crate::NimdError;
use crate::handshake::perform_open;

/// Settings for one server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,
    /// How long a new connection may take to send `OPEN`, in
    /// milliseconds. `None` waits forever.
    pub handshake_timeout_ms: Option<u64>,
    /// Settings applied to every match.
    pub match_config: MatchConfig,
}

impl ServerConfig {
    /// The handshake timeout as a [`Duration`].
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            handshake_timeout_ms: None,
            match_config: MatchConfig::default(),
        }
    }
}

/// Builder for configuring and starting a nimd server.
///
/// # Example
///
/// ```rust,no_run
/// use nimd::prelude::*;
///
/// # async fn start() -> Result<(), NimdError> {
/// let server = NimdServer::builder()
///     .bind("0.0.0.0:7000")
///     .build()
///     .await?;
/// server.run().await;
/// # Ok(())
/// # }
/// ```
pub struct NimdServerBuilder {
    config: ServerConfig,
}

impl NimdServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to every match.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.config.match_config = config;
        self
    }

    /// Limits how long a new connection may take to send `OPEN`.
    pub fn handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.handshake_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Validates the configuration and binds the listener.
    ///
    /// # Errors
    /// [`NimdError::Match`] for an unplayable match configuration and
    /// [`NimdError::Transport`] if the address can't be bound.
    pub async fn build(self) -> Result<NimdServer, NimdError> {
        self.config.match_config.validate()?;
        let transport = TcpTransport::bind(&self.config.bind_addr).await?;

        Ok(NimdServer {
            transport,
            registry: Registry::new(),
            config: self.config,
            matches: JoinSet::new(),
        })
    }
}

impl Default for NimdServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound nimd server.
///
/// Call [`run()`](Self::run) to start pairing players.
pub struct NimdServer {
    transport: TcpTransport,
    registry: Registry,
    config: ServerConfig,
    matches: JoinSet<(MatchId, Outcome)>,
}

impl NimdServer {
    /// Creates a new builder.
    pub fn builder() -> NimdServerBuilder {
        NimdServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The registry of names currently in play.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs the matchmaking loop until the process is terminated.
    ///
    /// Failures after startup are handled per connection or per match
    /// and never end the loop.
    ///
    /// Players are paired strictly in arrival order. The first of a pair
    /// is told to `WAIT`; if the second then fails its handshake, the
    /// first is disconnected too and pairing starts over. Each complete
    /// pair plays in its own task, so a match that fails or panics never
    /// takes the server down.
    pub async fn run(mut self) {
        match self.local_addr() {
            Ok(addr) => tracing::info!(%addr, "nimd server listening"),
            Err(e) => tracing::warn!(error = %e, "nimd server listening on unknown address"),
        }

        loop {
            let Some(first) = self.admit().await else {
                continue;
            };
            if let Err(e) = first.peer.send(&Message::Wait).await {
                tracing::debug!(conn_id = %first.peer.id(), error = %e, "failed to send WAIT");
            }

            let Some(second) = self.admit().await else {
                tracing::info!(
                    player = %first.registration.name(),
                    "second player rejected, dropping waiting player"
                );
                first.peer.close().await;
                continue;
            };

            self.start_match(first, second);
        }
    }

    /// Accepts one connection and runs its handshake.
    async fn admit(&mut self) -> Option<Seat<TcpConnection>> {
        let conn = self.accept().await;
        let conn_id = conn.id();
        tracing::debug!(%conn_id, peer_addr = %conn.peer_addr(), "connection accepted");

        let timeout = self.config.handshake_timeout();
        match perform_open(Peer::new(conn), &self.registry, timeout).await {
            Ok(seat) => Some(seat),
            Err(e) => {
                tracing::info!(%conn_id, error = %e, "handshake failed");
                None
            }
        }
    }

    /// Waits for the next connection, reaping finished matches meanwhile.
    async fn accept(&mut self) -> TcpConnection {
        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => return conn,
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
                Some(joined) = self.matches.join_next() => reap(joined),
            }
        }
    }

    fn start_match(&mut self, one: Seat<TcpConnection>, two: Seat<TcpConnection>) {
        let id = MatchId::next();
        tracing::info!(
            match_id = %id,
            player1 = %one.registration.name(),
            player2 = %two.registration.name(),
            "players paired"
        );
        let game = Match::new(id, one, two, &self.config.match_config);
        self.matches.spawn(async move { (id, game.run().await) });
    }
}

/// Logs how a match task ended.
fn reap(joined: Result<(MatchId, Outcome), JoinError>) {
    match joined {
        Ok((id, outcome)) => tracing::debug!(match_id = %id, %outcome, "match task reaped"),
        Err(e) if e.is_panic() => tracing::error!(error = %e, "match task panicked"),
        Err(e) => tracing::debug!(error = %e, "match task cancelled"),
    }
}
