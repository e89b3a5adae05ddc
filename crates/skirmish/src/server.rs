//! `SkirmishServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → room manager.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use skirmish_protocol::{Codec, JsonCodec};
use skirmish_room::{MoveSourceFactory, RandomMoves, RoomConfig, RoomManager};
use skirmish_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ServerConfig, SkirmishError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomManager,
    pub(crate) codec: C,
    /// Outbound envelope timestamps count from here.
    pub(crate) started: Instant,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server started.
    pub(crate) fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,ignore
/// let server = SkirmishServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig { auto_advance: true, ..RoomConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct SkirmishServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    move_source: MoveSourceFactory,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig {
            bind_addr: "127.0.0.1:8080".to_string(),
            ..ServerConfig::default()
        })
    }

    /// Starts from a full [`ServerConfig`].
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr,
            room_config: config.room,
            move_source: RandomMoves::factory(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets where auto-moves come from. Defaults to [`RandomMoves`].
    pub fn move_source(mut self, factory: MoveSourceFactory) -> Self {
        self.move_source = factory;
        self
    }

    /// Binds the listener. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SkirmishServer<JsonCodec>, SkirmishError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: RoomManager::with_move_source(self.room_config, self.move_source),
            codec: JsonCodec,
            started: Instant::now(),
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkirmishServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SkirmishServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }
}

impl<C: Codec> SkirmishServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, SkirmishError> {
        Ok(self.transport.local_addr()?)
    }

    /// Number of rooms currently running.
    pub fn room_count(&self) -> usize {
        self.state.rooms.room_count()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!("skirmish server running");

        loop {
            match self.transport.accept().await {
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
            }
        }
    }
}
