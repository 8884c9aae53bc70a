//! Push transport: the persistent `WebSocket` channel.
//!
//! The push channel is the preferred transport. It carries new counter
//! values as bare numeric text frames from the device, and accepts the
//! text commands `"step"` and `"ping"` from the client. The client
//! pings on a short fixed interval to keep the connection warm and to
//! detect silent drops; the device's own liveness probing happens at
//! the protocol level (Ping/Pong frames).

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::error::ClientError;

/// Subprotocol tag the device expects on its push channel.
pub const PUSH_SUBPROTOCOL: &str = "arduino";

/// Events the push channel yields to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEvent {
    /// A new authoritative counter value.
    Value(u64),

    /// The device closed the connection.
    Closed,
}

/// Write half of an established push connection.
pub type PushSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of an established push connection.
pub type PushStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// An established push connection, split for independent reading and
/// writing inside the session's select loop.
#[derive(Debug)]
pub struct PushConnection {
    /// Outgoing frames (commands, keep-warm pings, pong replies).
    pub sink: PushSink,

    /// Incoming frames.
    pub stream: PushStream,
}

impl PushConnection {
    /// Connect to the device's push channel.
    ///
    /// `url` addresses the push listener root, e.g. `ws://jar.local:8081/`.
    /// The `arduino` subprotocol is requested on the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the handshake fails, or
    /// [`ClientError::Protocol`] if the URL cannot form a request.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| ClientError::Protocol {
                message: format!("invalid push URL {url}: {e}"),
            })?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(PUSH_SUBPROTOCOL),
        );

        let (socket, response) = connect_async(request).await?;
        debug!(url, status = %response.status(), "push channel connected");

        let (sink, stream) = socket.split();
        Ok(Self { sink, stream })
    }
}

/// Send the step command on an open push channel.
///
/// # Errors
///
/// Returns [`ClientError::Transport`] if the frame cannot be sent.
pub async fn send_step(sink: &mut PushSink) -> Result<(), ClientError> {
    sink.send(Message::Text(String::from("step"))).await?;
    Ok(())
}

/// Send a keep-warm ping on an open push channel.
///
/// This is the application-level text `"ping"`, not a protocol Ping
/// frame; the device logs and ignores it. The traffic exists to keep
/// intermediaries from idling the connection and to surface silent
/// drops as send failures.
///
/// # Errors
///
/// Returns [`ClientError::Transport`] if the frame cannot be sent.
pub async fn send_keep_warm_ping(sink: &mut PushSink) -> Result<(), ClientError> {
    sink.send(Message::Text(String::from("ping"))).await?;
    Ok(())
}

/// Interpret one incoming frame.
///
/// Numeric text frames become [`PushEvent::Value`]; protocol Ping frames
/// must be answered by the caller (the sink lives there); everything
/// else is noise.
pub fn parse_frame(message: &Message) -> Option<PushEvent> {
    match message {
        Message::Text(text) => match text.trim().parse::<u64>() {
            Ok(value) => Some(PushEvent::Value(value)),
            Err(_) => {
                debug!(frame = %text, "ignoring non-numeric text frame");
                None
            }
        },
        Message::Close(_) => Some(PushEvent::Closed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_frames_parse_to_values() {
        let message = Message::Text(String::from("104729"));
        assert_eq!(parse_frame(&message), Some(PushEvent::Value(104_729)));
    }

    #[test]
    fn whitespace_is_tolerated() {
        let message = Message::Text(String::from(" 13\n"));
        assert_eq!(parse_frame(&message), Some(PushEvent::Value(13)));
    }

    #[test]
    fn non_numeric_frames_are_ignored() {
        let message = Message::Text(String::from("hello"));
        assert_eq!(parse_frame(&message), None);
    }

    #[test]
    fn close_frames_signal_shutdown() {
        let message = Message::Close(None);
        assert_eq!(parse_frame(&message), Some(PushEvent::Closed));
    }

    #[test]
    fn pong_frames_are_not_values() {
        let message = Message::Pong(Vec::new());
        assert_eq!(parse_frame(&message), None);
    }
}
