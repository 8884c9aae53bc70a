//! Transport selection for client-initiated commands.
//!
//! The two transports are capabilities, not peers: the push channel is
//! preferred whenever it is open, and the poll gateway is the fallback.
//! [`UpdateSource`] makes that choice explicit at the call site -- a
//! command goes through exactly one variant, never both, so a single
//! logical action cannot be issued twice.

use crate::error::ClientError;
use crate::poll::PollSource;
use crate::push::{self, PushSink};

/// The transport a command travels over.
#[derive(Debug)]
pub enum UpdateSource<'a> {
    /// Poll-based fallback: commands go through the HTTP gateway.
    Pull(&'a PollSource),

    /// Live push channel: commands go out as text frames.
    Push(&'a mut PushSink),
}

impl UpdateSource<'_> {
    /// Whether this source is the persistent push channel.
    pub const fn is_push(&self) -> bool {
        matches!(self, Self::Push(_))
    }

    /// Command a step over this source.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] (pull) or
    /// [`ClientError::Transport`] (push) if the command is rejected;
    /// the caller surfaces it and retries on its own schedule.
    pub async fn command_step(self) -> Result<(), ClientError> {
        match self {
            Self::Pull(poll) => poll.command_step().await,
            Self::Push(sink) => push::send_step(sink).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_source_is_not_push() {
        let poll = PollSource::new("http://jar.local:8080");
        let source = UpdateSource::Pull(&poll);
        assert!(!source.is_push());
    }
}
