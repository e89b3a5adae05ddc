/// Errors raised while accepting, reading from, or writing to a client
/// connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The WebSocket upgrade handshake was rejected or broke off.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// Writing a frame to the peer failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Reading a frame from the peer failed.
    #[error("receive failed: {0}")]
    Receive(String),
}
