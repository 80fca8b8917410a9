//! Error types for the realtime client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtimeError {
    /// No auth token was available when a connection was requested.
    #[error("No auth token available")]
    MissingToken,

    /// An error from the WebSocket layer.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server ended the channel without a manual disconnect.
    #[error("Connection closed by server")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, RealtimeError>;
