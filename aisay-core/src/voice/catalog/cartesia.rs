//! Cartesia voice catalog over the REST API

use async_trait::async_trait;
use reqwest::Client;

use super::provider::{VoiceCatalog, VoicePage};
use crate::error::{Result, SayError};
use crate::settings::Settings;

const API_KEY_HEADER: &str = "X-API-Key";
const VERSION_HEADER: &str = "Cartesia-Version";

pub struct CartesiaCatalog {
    client: Client,
    voices_url: String,
    api_key: String,
    api_version: String,
}

impl CartesiaCatalog {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            voices_url: format!("{}/voices", settings.api_base.trim_end_matches('/')),
            api_key: settings.api_key()?.to_string(),
            api_version: settings.api_version.clone(),
        })
    }
}

#[async_trait]
impl VoiceCatalog for CartesiaCatalog {
    async fn fetch_page(&self, limit: usize, starting_after: Option<&str>) -> Result<VoicePage> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = starting_after {
            query.push(("starting_after", cursor.to_string()));
        }

        let response = self
            .client
            .get(&self.voices_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(VERSION_HEADER, &self.api_version)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "voice catalog request failed");
            return Err(SayError::CatalogFetch(status.to_string()));
        }

        let page: VoicePage = response
            .json()
            .await
            .map_err(|e| SayError::CatalogFetch(format!("failed to parse voices response: {e}")))?;

        tracing::debug!(
            records = page.data.len(),
            has_more = page.has_more,
            cursor = ?starting_after,
            "fetched voice page"
        );

        Ok(page)
    }
}
