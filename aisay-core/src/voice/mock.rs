//! In-memory catalog, connection, and audio output for exercising the
//! pipeline without a network or sound card

use async_trait::async_trait;
use base64::Engine;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

use crate::error::{Result, SayError};
use crate::voice::audio::AudioOutput;
use crate::voice::catalog::provider::{VoiceCatalog, VoicePage, VoiceRecord};
use crate::voice::tts::provider::{SynthesisConnection, SynthesisConnector};

/// Shared view of a mock's recorded activity
#[derive(Debug)]
pub struct Probe<T>(Arc<Mutex<T>>);

impl<T> Clone for Probe<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + Default> Probe<T> {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(T::default())))
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> T {
        self.lock().clone()
    }
}

/// Catalog serving a fixed voice list, honoring `limit` and the cursor
#[derive(Clone)]
pub struct MockCatalog {
    voices: Vec<VoiceRecord>,
    failure: Option<String>,
    cursors: Probe<Vec<Option<String>>>,
}

impl MockCatalog {
    pub fn new(voices: Vec<VoiceRecord>) -> Self {
        Self {
            voices,
            failure: None,
            cursors: Probe::new(),
        }
    }

    /// Every fetch fails with the given status text
    pub fn failing(status: impl Into<String>) -> Self {
        Self {
            failure: Some(status.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Cursor passed to each fetch, in call order
    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.snapshot()
    }

    pub fn fetch_count(&self) -> usize {
        self.cursors.lock().len()
    }
}

#[async_trait]
impl VoiceCatalog for MockCatalog {
    async fn fetch_page(&self, limit: usize, starting_after: Option<&str>) -> Result<VoicePage> {
        self.cursors.lock().push(starting_after.map(str::to_string));

        if let Some(status) = &self.failure {
            return Err(SayError::CatalogFetch(status.clone()));
        }

        let start = match starting_after {
            None => 0,
            Some(cursor) => {
                self.voices
                    .iter()
                    .position(|v| v.id == cursor)
                    .ok_or_else(|| SayError::CatalogFetch(format!("unknown cursor {cursor}")))?
                    + 1
            }
        };
        let end = (start + limit).min(self.voices.len());

        Ok(VoicePage {
            data: self.voices[start..end].to_vec(),
            has_more: end < self.voices.len(),
        })
    }
}

/// A scripted inbound frame
#[derive(Debug, Clone)]
pub enum MockFrame {
    Text(String),
    /// The connection fails with this reason when the frame is read
    Fail(String),
}

impl MockFrame {
    pub fn chunk(audio: &[u8], done: bool) -> Self {
        let data = base64::engine::general_purpose::STANDARD.encode(audio);
        Self::Text(
            serde_json::json!({ "type": "chunk", "data": data, "done": done }).to_string(),
        )
    }

    pub fn done() -> Self {
        Self::Text(r#"{"type":"done","done":true}"#.to_string())
    }

    pub fn error(message: &str) -> Self {
        Self::Text(
            serde_json::json!({ "type": "error", "error": message, "done": true }).to_string(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionLog {
    pub connects: usize,
    pub sent: Vec<String>,
    pub frames_read: usize,
    pub closed: bool,
}

/// Connector whose connections replay scripted frames, then report the peer
/// as closed
#[derive(Clone)]
pub struct MockConnector {
    frames: Vec<MockFrame>,
    refusal: Option<String>,
    log: Probe<ConnectionLog>,
}

impl MockConnector {
    pub fn new(frames: Vec<MockFrame>) -> Self {
        Self {
            frames,
            refusal: None,
            log: Probe::new(),
        }
    }

    /// Connecting fails with the given reason
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refusal: Some(reason.into()),
            ..Self::new(Vec::new())
        }
    }

    pub fn log(&self) -> ConnectionLog {
        self.log.snapshot()
    }
}

#[async_trait]
impl SynthesisConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn SynthesisConnection>> {
        self.log.lock().connects += 1;
        if let Some(reason) = &self.refusal {
            return Err(SayError::Transport(reason.clone()));
        }
        Ok(Box::new(MockConnection {
            frames: self.frames.clone().into(),
            log: self.log.clone(),
        }))
    }
}

struct MockConnection {
    frames: VecDeque<MockFrame>,
    log: Probe<ConnectionLog>,
}

#[async_trait]
impl SynthesisConnection for MockConnection {
    async fn send_text(&mut self, payload: String) -> Result<()> {
        self.log.lock().sent.push(payload);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String>> {
        let frame = self.frames.pop_front()?;
        self.log.lock().frames_read += 1;
        match frame {
            MockFrame::Text(text) => Some(Ok(text)),
            MockFrame::Fail(reason) => Some(Err(SayError::Transport(reason))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().closed = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    pub writes: Vec<Vec<u8>>,
    pub finishes: usize,
    pub drained: bool,
}

/// Audio output that records writes. A gated output only reports drained
/// once its sender fires.
pub struct RecordingOutput {
    log: Probe<OutputLog>,
    drain_gate: Option<oneshot::Receiver<()>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self {
            log: Probe::new(),
            drain_gate: None,
        }
    }

    pub fn gated() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let output = Self {
            log: Probe::new(),
            drain_gate: Some(rx),
        };
        (output, tx)
    }

    pub fn probe(&self) -> Probe<OutputLog> {
        self.log.clone()
    }
}

impl Default for RecordingOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl AudioOutput for RecordingOutput {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        self.log.lock().writes.push(pcm.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.log.lock().finishes += 1;
        Ok(())
    }

    async fn drained(&mut self) -> Result<()> {
        if let Some(gate) = self.drain_gate.take() {
            gate.await
                .map_err(|_| SayError::Device("drain acknowledgment dropped".to_string()))?;
        }
        self.log.lock().drained = true;
        Ok(())
    }
}
