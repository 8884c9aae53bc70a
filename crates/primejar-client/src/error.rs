//! Error types for the client crate.
//!
//! None of these are fatal to a running session: transport errors put
//! the session into its reconnect cycle, request errors mean "no update
//! this cycle," and protocol desyncs are recovered by snapping the
//! display to the authoritative value.

/// Errors that can occur on the client side.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The persistent channel is unreachable or dropped.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying `WebSocket` error.
        #[from]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// A poll or step request failed.
    #[error("request error: {source}")]
    Request {
        /// The underlying HTTP error.
        #[from]
        source: reqwest::Error,
    },

    /// The peer sent something outside the protocol.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the violation.
        message: String,
    },
}
