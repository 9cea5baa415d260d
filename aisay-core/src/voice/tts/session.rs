//! One synthesis exchange: send a request, stream the audio into an output,
//! and wait for the output to drain.
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Draining -> Closed
//!    \________\______________\___________\_____-> Failed
//! ```

use super::provider::{SynthesisConnection, SynthesisConnector};
use super::types::{ServerMessage, SynthesisRequest};
use crate::error::{Result, SayError};
use crate::voice::audio::AudioOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Draining,
    Closed,
    Failed,
}

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub chunks: usize,
    pub bytes: usize,
    pub state: SessionState,
}

pub struct SynthesisSession<'a> {
    connector: &'a dyn SynthesisConnector,
    state: SessionState,
    chunks: usize,
    bytes: usize,
}

impl<'a> SynthesisSession<'a> {
    pub fn new(connector: &'a dyn SynthesisConnector) -> Self {
        Self {
            connector,
            state: SessionState::Idle,
            chunks: 0,
            bytes: 0,
        }
    }

    /// Run the session to completion. Consumes the session: each one sends
    /// exactly one request.
    pub async fn run(
        mut self,
        request: &SynthesisRequest,
        output: &mut dyn AudioOutput,
    ) -> Result<SessionReport> {
        match self.drive(request, output).await {
            Ok(()) => {
                self.transition(SessionState::Closed);
                Ok(SessionReport {
                    chunks: self.chunks,
                    bytes: self.bytes,
                    state: self.state,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, from = ?self.state, "synthesis session failed");
                self.transition(SessionState::Failed);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    async fn drive(
        &mut self,
        request: &SynthesisRequest,
        output: &mut dyn AudioOutput,
    ) -> Result<()> {
        self.transition(SessionState::Connecting);
        let mut connection = self.connector.connect().await?;

        let streamed = self.stream(connection.as_mut(), request, output).await;
        if let Err(e) = streamed {
            if let Err(close_err) = connection.close().await {
                tracing::debug!(error = %close_err, "close after failure");
            }
            return Err(e);
        }

        self.transition(SessionState::Draining);
        output.finish()?;
        if let Err(e) = connection.close().await {
            tracing::warn!(error = %e, "failed to close synthesis connection cleanly");
        }

        output.drained().await?;
        tracing::info!(
            chunks = self.chunks,
            bytes = self.bytes,
            context_id = request.context_id(),
            "playback drained"
        );
        Ok(())
    }

    /// Send the request and forward audio until the done marker
    async fn stream(
        &mut self,
        connection: &mut dyn SynthesisConnection,
        request: &SynthesisRequest,
        output: &mut dyn AudioOutput,
    ) -> Result<()> {
        connection.send_text(request.to_json()?).await?;
        self.transition(SessionState::Streaming);
        tracing::info!(
            model = request.model_id(),
            voice = request.voice_id(),
            context_id = request.context_id(),
            "synthesis request sent"
        );

        while let Some(frame) = connection.next_text().await {
            match ServerMessage::parse(&frame?)? {
                ServerMessage::Error(message) => return Err(SayError::Synthesis(message)),
                ServerMessage::Chunk { audio, done } => {
                    output.write(&audio)?;
                    self.chunks += 1;
                    self.bytes += audio.len();
                    tracing::debug!(chunk = self.chunks, bytes = audio.len(), done, "audio chunk");
                    if done {
                        return Ok(());
                    }
                }
                ServerMessage::Done => return Ok(()),
                ServerMessage::Other(kind) => {
                    tracing::debug!(kind = %kind, "ignoring server message");
                }
            }
        }

        Err(SayError::Transport(
            "connection closed before synthesis completed".to_string(),
        ))
    }
}
