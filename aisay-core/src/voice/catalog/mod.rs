//! Voice catalog lookup and name resolution

pub mod cartesia;
pub mod provider;
pub mod resolver;
