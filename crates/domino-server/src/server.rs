//! `DominoServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → room coordinator.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use domino_protocol::{Codec, JsonCodec};
use domino_room::{RoomConfig, RoomCoordinator};
use domino_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{DominoError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// The coordinator does its own locking, so the state itself needs none.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomCoordinator,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a domino server.
///
/// # Example
///
/// ```rust,no_run
/// use domino_server::prelude::*;
///
/// # async fn run() -> Result<(), DominoError> {
/// let server = DominoServer::builder()
///     .bind("0.0.0.0:3001")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct DominoServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    idle_timeout: Option<Duration>,
}

impl DominoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_addr: defaults.listen_addr.to_string(),
            room_config: defaults.room,
            idle_timeout: defaults.idle_timeout,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration shared by every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how long a silent connection is kept open. `None` disables
    /// the timeout.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Applies every setting from a loaded [`ServerConfig`].
    pub fn config(self, config: &ServerConfig) -> Self {
        self.bind(&config.listen_addr.to_string())
            .room_config(config.room.clone())
            .idle_timeout(config.idle_timeout)
    }

    /// Validates the match rules and binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<DominoServer<JsonCodec>, DominoError> {
        self.room_config.match_config.validate()?;
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: RoomCoordinator::new(self.room_config),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(DominoServer { transport, state })
    }
}

impl Default for DominoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound domino server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DominoServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl DominoServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DominoServerBuilder {
        DominoServerBuilder::new()
    }
}

impl<C: Codec> DominoServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, DominoError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), DominoError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops every
    /// room.
    ///
    /// Each accepted connection gets its own handler task.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), DominoError> {
        tracing::info!("domino server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => break,
            }
        }

        let rooms = self.state.rooms.room_count().await;
        tracing::info!(rooms, "shutting down");
        self.state.rooms.shutdown().await;
        Ok(())
    }
}
