//! External Verifier
//!
//! **Lookup strategy:**
//! 1. Authority identifier from the source row, when present
//! 2. Set code + collector number, when the key has a number
//! 3. Name search within the set: exact name (case-insensitive) preferred,
//!    otherwise the first result
//!
//! Every remote request passes the shared pacing gate. Every result, including
//! failures, is cached per query for the rest of the run, and a query already
//! in flight is awaited rather than sent again.

use super::{AuthorityCard, AuthorityClient, CacheKey, PacingGate, VerifierCache};
use crate::models::{NormalizedKey, PriceFields, RecordOrigin, ReferenceRecord, AUTHORITY_VERIFIED_ID};
use manatcg_common::config::{AliasConfig, VerifierConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Authority set code for a normalized set name
///
/// Alias table first; otherwise a set name of more than three characters and at
/// least two words becomes the initials of its first three words; otherwise the
/// set name is used as-is.
pub fn derive_set_code(set_name: &str, set_codes: &BTreeMap<String, String>) -> String {
    if let Some(code) = set_codes.get(set_name) {
        return code.clone();
    }

    let words: Vec<&str> = set_name.split_whitespace().collect();
    if set_name.chars().count() > 3 && words.len() >= 2 {
        return words
            .iter()
            .take(3)
            .filter_map(|w| w.chars().next())
            .collect::<String>()
            .to_lowercase();
    }

    set_name.to_string()
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

/// Build a reference record from an authority printing
pub fn synthesize_record(card: &AuthorityCard, condition: &str, product_line: &str) -> ReferenceRecord {
    let mut product_name = card.name.clone();
    if card.promo && !card.promo_types.is_empty() {
        product_name.push_str(&format!(" ({})", title_case(&card.promo_types.join(", "))));
    }

    ReferenceRecord {
        identifier: AUTHORITY_VERIFIED_ID.to_string(),
        product_line: product_line.to_string(),
        set_name: card.set_name.clone(),
        product_name,
        number: card.collector_number.clone(),
        rarity: title_case(&card.rarity),
        condition: condition.to_string(),
        prices: PriceFields::default(),
        origin: RecordOrigin::Authority,
    }
}

/// Cached, paced authority lookups
pub struct ExternalVerifier {
    client: Arc<dyn AuthorityClient>,
    cache: VerifierCache,
    gate: PacingGate,
    set_codes: BTreeMap<String, String>,
}

impl ExternalVerifier {
    pub fn new(client: Arc<dyn AuthorityClient>, config: &VerifierConfig, aliases: &AliasConfig) -> Self {
        Self {
            client,
            cache: VerifierCache::new(),
            gate: PacingGate::from_millis(config.min_interval_ms),
            set_codes: aliases.set_codes.clone(),
        }
    }

    /// Result cache
    pub fn cache(&self) -> &VerifierCache {
        &self.cache
    }

    /// Look the key up at the authority
    ///
    /// `authority_id` is the identifier carried by the source row, if any.
    pub async fn verify(&self, key: &NormalizedKey, authority_id: Option<&str>) -> Option<AuthorityCard> {
        if let Some(id) = authority_id {
            if let Some(card) = self.lookup_id(id).await {
                return Some(card);
            }
        }

        let set_code = derive_set_code(&key.set_name, &self.set_codes);
        let card = self
            .lookup_printing(&key.name, &set_code, key.collector_number.as_deref())
            .await;

        match &card {
            Some(found) => debug!(
                name = %key.name,
                set_code = %set_code,
                found = %found.name,
                "Authority verified printing"
            ),
            None => debug!(name = %key.name, set_code = %set_code, "Authority has no printing"),
        }
        card
    }

    async fn lookup_id(&self, id: &str) -> Option<AuthorityCard> {
        let cache_key = CacheKey::Id(id.to_string());
        self.cache
            .get_or_fetch(cache_key, move || async move {
                self.gate.wait().await;
                match self.client.card_by_id(id).await {
                    Ok(card) => card,
                    Err(e) => {
                        warn!(id = %id, error = %e, "Authority lookup by id failed");
                        None
                    }
                }
            })
            .await
    }

    async fn lookup_printing(&self, name: &str, set_code: &str, number: Option<&str>) -> Option<AuthorityCard> {
        let cache_key = CacheKey::Printing {
            name: name.to_string(),
            set_code: set_code.to_string(),
            number: number.map(str::to_string),
        };
        self.cache
            .get_or_fetch(cache_key, move || self.fetch_printing(name, set_code, number))
            .await
    }

    async fn fetch_printing(&self, name: &str, set_code: &str, number: Option<&str>) -> Option<AuthorityCard> {
        if let Some(number) = number {
            self.gate.wait().await;
            match self.client.card_by_number(set_code, number).await {
                Ok(Some(card)) => return Some(card),
                Ok(None) => {}
                Err(e) => {
                    warn!(name = %name, set_code = %set_code, error = %e, "Authority lookup failed");
                    return None;
                }
            }
        }

        self.gate.wait().await;
        match self.client.search_in_set(name, set_code).await {
            Ok(cards) => pick_by_name(cards, name),
            Err(e) => {
                warn!(name = %name, set_code = %set_code, error = %e, "Authority search failed");
                None
            }
        }
    }
}

fn pick_by_name(cards: Vec<AuthorityCard>, name: &str) -> Option<AuthorityCard> {
    let wanted = name.to_lowercase();
    match cards.iter().position(|c| c.name.to_lowercase() == wanted) {
        Some(i) => cards.into_iter().nth(i),
        None => cards.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::authority::VerifierError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn card(name: &str, number: &str) -> AuthorityCard {
        AuthorityCard {
            id: format!("id-{}", number),
            name: name.to_string(),
            set: "c21".to_string(),
            set_name: "Commander 2021".to_string(),
            collector_number: number.to_string(),
            rarity: "uncommon".to_string(),
            promo: false,
            promo_types: Vec::new(),
            ..AuthorityCard::default()
        }
    }

    #[derive(Default)]
    struct FakeClient {
        by_id: Option<AuthorityCard>,
        by_number: Option<AuthorityCard>,
        search: Vec<AuthorityCard>,
        fail: bool,
        delay_ms: u64,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthorityClient for FakeClient {
        async fn card_by_id(&self, _id: &str) -> Result<Option<AuthorityCard>, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VerifierError::Network("connection refused".to_string()));
            }
            Ok(self.by_id.clone())
        }

        async fn card_by_number(&self, _set: &str, _number: &str) -> Result<Option<AuthorityCard>, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                return Err(VerifierError::Status(500));
            }
            Ok(self.by_number.clone())
        }

        async fn search_in_set(&self, _name: &str, _set: &str) -> Result<Vec<AuthorityCard>, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VerifierError::Status(500));
            }
            Ok(self.search.clone())
        }
    }

    fn key(number: Option<&str>) -> NormalizedKey {
        NormalizedKey {
            name: "sol ring".to_string(),
            set_name: "commander 2021".to_string(),
            collector_number: number.map(str::to_string),
            condition: "near mint".to_string(),
            name_suffix: String::new(),
        }
    }

    fn verifier(client: Arc<FakeClient>) -> ExternalVerifier {
        let config = VerifierConfig {
            min_interval_ms: 0,
            ..VerifierConfig::default()
        };
        ExternalVerifier::new(client, &config, &AliasConfig::default())
    }

    #[tokio::test]
    async fn test_id_lookup_short_circuits() {
        let client = Arc::new(FakeClient {
            by_id: Some(card("Sol Ring", "263")),
            ..Default::default()
        });
        let v = verifier(Arc::clone(&client));

        let found = v.verify(&key(Some("263")), Some("abc")).await;
        assert_eq!(found.unwrap().collector_number, "263");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_number_falls_back_to_search_preferring_exact_name() {
        let client = Arc::new(FakeClient {
            search: vec![card("Sol Ring Token", "1"), card("Sol Ring", "263")],
            ..Default::default()
        });
        let v = verifier(Arc::clone(&client));

        let found = v.verify(&key(Some("999")), None).await.unwrap();
        assert_eq!(found.name, "Sol Ring");
        // number lookup, then search
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_without_exact_name_takes_first() {
        let client = Arc::new(FakeClient {
            search: vec![card("Sol Ring // Back", "5"), card("Other", "6")],
            ..Default::default()
        });
        let v = verifier(client);

        let found = v.verify(&key(None), None).await.unwrap();
        assert_eq!(found.collector_number, "5");
    }

    #[tokio::test]
    async fn test_failures_cached_as_negative() {
        let client = Arc::new(FakeClient {
            fail: true,
            ..Default::default()
        });
        let v = verifier(Arc::clone(&client));

        assert!(v.verify(&key(Some("1")), None).await.is_none());
        let calls_after_first = client.calls.load(Ordering::SeqCst);
        assert!(v.verify(&key(Some("1")), None).await.is_none());

        assert_eq!(client.calls.load(Ordering::SeqCst), calls_after_first);
        assert_eq!(v.cache().negative_count().await, 1);
    }

    #[tokio::test]
    async fn test_positive_results_cached() {
        let client = Arc::new(FakeClient {
            by_number: Some(card("Sol Ring", "263")),
            ..Default::default()
        });
        let v = verifier(Arc::clone(&client));

        v.verify(&key(Some("263")), None).await;
        v.verify(&key(Some("263")), None).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_lookups_of_same_printing_share_one_request() {
        // Given: a slow authority and two keys differing only in condition
        let client = Arc::new(FakeClient {
            by_number: Some(card("Sol Ring", "263")),
            delay_ms: 200,
            ..Default::default()
        });
        let v = verifier(Arc::clone(&client));
        let plain = key(Some("263"));
        let mut foil = key(Some("263"));
        foil.condition = "near mint foil".to_string();

        // When: both are verified at the same time
        let (a, b) = tokio::join!(v.verify(&plain, None), v.verify(&foil, None));

        // Then: one request answers both
        assert_eq!(a, b);
        assert_eq!(a.unwrap().collector_number, "263");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(v.cache().len().await, 1);
    }

    #[test]
    fn test_set_code_derivation() {
        let table = AliasConfig::default().set_codes;
        assert_eq!(derive_set_code("the list reprints", &table), "plst");
        assert_eq!(derive_set_code("edge of eternities", &table), "eoe");
        assert_eq!(derive_set_code("modern horizons 2", &table), "mh2");
        assert_eq!(derive_set_code("ltr", &table), "ltr");
        assert_eq!(derive_set_code("alliances", &table), "alliances");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("prerelease, datestamped"), "Prerelease, Datestamped");
        assert_eq!(title_case("mythic"), "Mythic");
        assert_eq!(title_case("RARE"), "Rare");
    }

    #[test]
    fn test_synthesized_record_for_promo() {
        let mut promo = card("Sol Ring", "263p");
        promo.promo = true;
        promo.promo_types = vec!["prerelease".to_string(), "datestamped".to_string()];

        let record = synthesize_record(&promo, "Near Mint Foil", "Magic: The Gathering");
        assert_eq!(record.identifier, AUTHORITY_VERIFIED_ID);
        assert_eq!(record.product_name, "Sol Ring (Prerelease, Datestamped)");
        assert_eq!(record.rarity, "Uncommon");
        assert_eq!(record.condition, "Near Mint Foil");
        assert_eq!(record.origin, RecordOrigin::Authority);
    }

    #[test]
    fn test_synthesized_record_without_promo_keeps_name() {
        let record = synthesize_record(&card("Sol Ring", "263"), "Near Mint", "Magic: The Gathering");
        assert_eq!(record.product_name, "Sol Ring");
        assert_eq!(record.number, "263");
    }
}
