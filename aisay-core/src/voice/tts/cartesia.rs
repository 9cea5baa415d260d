//! Cartesia streaming synthesis over a websocket

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::provider::{SynthesisConnection, SynthesisConnector};
use crate::error::{Result, SayError};
use crate::settings::Settings;

pub struct CartesiaConnector {
    url: Url,
}

impl CartesiaConnector {
    pub fn new(settings: &Settings) -> Result<Self> {
        let endpoint = format!("{}/tts/websocket", settings.ws_base.trim_end_matches('/'));
        let mut url = Url::parse(&endpoint)
            .map_err(|e| SayError::Config(format!("invalid websocket url {endpoint}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api_key", settings.api_key()?)
            .append_pair("cartesia_version", &settings.api_version);

        Ok(Self { url })
    }

    /// Endpoint without the query string, safe to log
    fn endpoint(&self) -> String {
        format!(
            "{}://{}{}",
            self.url.scheme(),
            self.url.host_str().unwrap_or_default(),
            self.url.path()
        )
    }
}

#[async_trait]
impl SynthesisConnector for CartesiaConnector {
    async fn connect(&self) -> Result<Box<dyn SynthesisConnection>> {
        tracing::debug!(endpoint = %self.endpoint(), "opening synthesis connection");

        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| SayError::Transport(format!("failed to connect: {e}")))?;

        Ok(Box::new(WebSocketConnection { stream }))
    }
}

pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl SynthesisConnection for WebSocketConnection {
    async fn send_text(&mut self, payload: String) -> Result<()> {
        self.stream.send(Message::Text(payload)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(e.into())),
            };

            match message {
                Message::Text(text) => return Some(Ok(text)),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "server closed synthesis connection");
                    return None;
                }
                _ => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
