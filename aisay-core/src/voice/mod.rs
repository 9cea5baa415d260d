//! Streaming text-to-speech: voice lookup, the synthesis session, and audio output

pub mod audio;
pub mod catalog;
pub mod mock;
pub mod pipeline;
pub mod tts;
