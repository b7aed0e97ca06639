//! Scryfall API client
//!
//! Plain HTTP access only. Pacing and caching are the verifier's job, so every
//! method here issues exactly one request.

use super::{AuthorityCard, AuthorityClient, VerifierError};
use async_trait::async_trait;
use manatcg_common::config::VerifierConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Search endpoint response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_cards: u32,
    #[serde(default)]
    data: Vec<AuthorityCard>,
}

/// Scryfall API client
pub struct ScryfallClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(config: &VerifierConfig) -> Result<Self, VerifierError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VerifierError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_card(&self, url: &str) -> Result<Option<AuthorityCard>, VerifierError> {
        tracing::debug!(url = %url, "Querying authority");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| VerifierError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(VerifierError::Status(status.as_u16()));
        }

        let card: AuthorityCard = response
            .json()
            .await
            .map_err(|e| VerifierError::Parse(e.to_string()))?;
        Ok(Some(card))
    }
}

#[async_trait]
impl AuthorityClient for ScryfallClient {
    async fn card_by_id(&self, id: &str) -> Result<Option<AuthorityCard>, VerifierError> {
        let url = format!("{}/cards/{}", self.base_url, id);
        self.get_card(&url).await
    }

    async fn card_by_number(
        &self,
        set_code: &str,
        number: &str,
    ) -> Result<Option<AuthorityCard>, VerifierError> {
        let url = format!("{}/cards/{}/{}", self.base_url, set_code, number);
        self.get_card(&url).await
    }

    async fn search_in_set(
        &self,
        name: &str,
        set_code: &str,
    ) -> Result<Vec<AuthorityCard>, VerifierError> {
        let url = format!("{}/cards/search", self.base_url);
        let query = format!("\"{}\" set:{}", name, set_code);

        tracing::debug!(url = %url, q = %query, "Searching authority");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| VerifierError::Network(e.to_string()))?;

        let status = response.status();
        // Search answers 404 when nothing matches
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(VerifierError::Status(status.as_u16()));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| VerifierError::Parse(e.to_string()))?;

        if search.total_cards == 0 {
            return Ok(Vec::new());
        }
        Ok(search.data)
    }
}
