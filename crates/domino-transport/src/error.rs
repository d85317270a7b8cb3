/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting a TCP connection or completing the WebSocket handshake failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The peer is gone; nothing more can be sent.
    #[error("connection closed")]
    ConnectionClosed,
}

impl TransportError {
    /// Wraps a WebSocket protocol error as an I/O error of `kind`.
    #[cfg(feature = "websocket")]
    pub(crate) fn io(
        kind: std::io::ErrorKind,
        err: tokio_tungstenite::tungstenite::Error,
    ) -> std::io::Error {
        std::io::Error::new(kind, err)
    }
}
