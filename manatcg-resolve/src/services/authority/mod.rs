//! External authority verification
//!
//! Confirms that a printing exists when the local reference catalog has no
//! confident candidate, and synthesizes a record from the authority's data.
//!
//! - [`AuthorityClient`]: the seam to the remote service (real client or fake)
//! - [`PacingGate`]: process-wide minimum interval between requests
//! - [`VerifierCache`]: positive and negative results, keyed by query
//! - [`ExternalVerifier`]: lookup strategy over the three above

pub mod cache;
pub mod pacing;
pub mod scryfall_client;
pub mod verifier;

pub use cache::{CacheKey, VerifierCache};
pub use pacing::PacingGate;
pub use scryfall_client::ScryfallClient;
pub use verifier::{derive_set_code, synthesize_record, title_case, ExternalVerifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authority lookup errors
///
/// Never surfaced past the verifier: every failure becomes a cached negative
/// result.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Client setup error: {0}")]
    Client(String),
}

/// Card printing as returned by the authority
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AuthorityCard {
    /// Authority identifier
    #[serde(default)]
    pub id: String,
    /// Full card name, both faces for two-faced cards
    #[serde(default)]
    pub name: String,
    /// Set code
    #[serde(default)]
    pub set: String,
    /// Set name
    #[serde(default)]
    pub set_name: String,
    /// Collector number
    #[serde(default)]
    pub collector_number: String,
    /// Rarity, lowercase
    #[serde(default)]
    pub rarity: String,
    /// Printing is a promo
    #[serde(default)]
    pub promo: bool,
    /// Promo kinds, e.g. `prerelease`, `datestamped`
    #[serde(default)]
    pub promo_types: Vec<String>,
    /// Available finishes, e.g. `nonfoil`, `foil`, `etched`
    #[serde(default)]
    pub finishes: Vec<String>,
    /// Border color, e.g. `black`, `borderless`
    #[serde(default)]
    pub border_color: String,
    /// Frame treatments, e.g. `showcase`, `extendedart`
    #[serde(default)]
    pub frame_effects: Vec<String>,
}

/// Remote authority service
#[async_trait]
pub trait AuthorityClient: Send + Sync {
    /// Fetch a printing by authority identifier; `Ok(None)` when unknown
    async fn card_by_id(&self, id: &str) -> Result<Option<AuthorityCard>, VerifierError>;

    /// Fetch a printing by set code and collector number; `Ok(None)` when unknown
    async fn card_by_number(
        &self,
        set_code: &str,
        number: &str,
    ) -> Result<Option<AuthorityCard>, VerifierError>;

    /// Search printings by name within a set; empty when nothing matches
    async fn search_in_set(
        &self,
        name: &str,
        set_code: &str,
    ) -> Result<Vec<AuthorityCard>, VerifierError>;
}
