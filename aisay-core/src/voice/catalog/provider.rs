use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Records requested per catalog page
pub const PAGE_SIZE: usize = 100;

/// A voice as listed by the backend catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
}

/// One page of catalog results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePage {
    #[serde(default)]
    pub data: Vec<VoiceRecord>,
    #[serde(default)]
    pub has_more: bool,
}

/// Trait for paginated voice catalogs
#[async_trait]
pub trait VoiceCatalog: Send + Sync {
    /// Fetch up to `limit` records following the record with ID `starting_after`
    async fn fetch_page(&self, limit: usize, starting_after: Option<&str>) -> Result<VoicePage>;
}
