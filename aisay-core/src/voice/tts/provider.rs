use async_trait::async_trait;

use crate::error::Result;

/// Opens duplex connections to a streaming synthesis backend
#[async_trait]
pub trait SynthesisConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SynthesisConnection>>;
}

/// A message-framed duplex connection carrying text payloads
#[async_trait]
pub trait SynthesisConnection: Send {
    /// Send one text frame
    async fn send_text(&mut self, payload: String) -> Result<()>;

    /// Receive the next text frame. Returns None once the peer has closed.
    async fn next_text(&mut self) -> Option<Result<String>>;

    /// Close the connection
    async fn close(&mut self) -> Result<()>;
}
