//! Streaming synthesis over a duplex connection

pub mod cartesia;
pub mod provider;
pub mod session;
pub mod types;
