use thiserror::Error;

pub type Result<T, E = SayError> = std::result::Result<T, E>;

/// Every variant is terminal: nothing in the pipeline retries.
#[derive(Error, Debug)]
pub enum SayError {
    #[error("{0}")]
    Config(String),

    #[error("failed to fetch voices: {0}")]
    CatalogFetch(String),

    #[error("voice not found: {0} (use --list to see available voices)")]
    VoiceNotFound(String),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("audio output error: {0}")]
    Device(String),
}

impl From<reqwest::Error> for SayError {
    fn from(source: reqwest::Error) -> Self {
        Self::CatalogFetch(source.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SayError {
    fn from(source: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(source.to_string())
    }
}

impl From<hound::Error> for SayError {
    fn from(source: hound::Error) -> Self {
        Self::Device(source.to_string())
    }
}
