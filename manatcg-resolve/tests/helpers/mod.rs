//! Test Helper Utilities
//!
//! Shared fixtures for manatcg-resolve integration tests: reference records,
//! collection rows, a fake authority client and a scripted review surface.

#![allow(dead_code)]

use async_trait::async_trait;
use manatcg_common::config::TomlConfig;
use manatcg_resolve::build_catalog;
use manatcg_resolve::models::{PriceFields, RecordOrigin, ReferenceCatalog, ReferenceRecord, SourceRow};
use manatcg_resolve::services::review::{DecisionSurface, ReviewAction, ReviewPrompt, SurfaceError};
use manatcg_resolve::services::{AuthorityCard, AuthorityClient, ExternalVerifier, VerifierError};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default configuration with the authority switched off and no pacing
pub fn offline_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.verifier.enabled = false;
    config.verifier.min_interval_ms = 0;
    config
}

pub fn record(id: &str, product: &str, set: &str, number: &str) -> ReferenceRecord {
    ReferenceRecord {
        identifier: id.to_string(),
        product_line: "Magic: The Gathering".to_string(),
        set_name: set.to_string(),
        product_name: product.to_string(),
        number: number.to_string(),
        rarity: "Rare".to_string(),
        condition: "Near Mint".to_string(),
        prices: PriceFields::default(),
        origin: RecordOrigin::Reference,
    }
}

pub fn priced_record(id: &str, product: &str, set: &str, number: &str, market: &str) -> ReferenceRecord {
    let mut r = record(id, product, set, number);
    r.prices.market = Some(market.to_string());
    r
}

pub fn row(name: &str, set: &str, number: &str) -> SourceRow {
    SourceRow {
        name: name.to_string(),
        set_name: set.to_string(),
        collector_number: number.to_string(),
        rarity: "rare".to_string(),
        quantity: "1".to_string(),
        condition: "near_mint".to_string(),
        purchase_price: "1.00".to_string(),
        ..SourceRow::default()
    }
}

pub fn catalog(config: &TomlConfig, records: Vec<ReferenceRecord>) -> ReferenceCatalog {
    build_catalog(records, &config.aliases)
}

/// Write `content` to `<dir>/<name>` and return the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

pub fn authority_card(name: &str, set: &str, set_name: &str, number: &str) -> AuthorityCard {
    AuthorityCard {
        id: format!("{}-{}", set, number),
        name: name.to_string(),
        set: set.to_string(),
        set_name: set_name.to_string(),
        collector_number: number.to_string(),
        rarity: "rare".to_string(),
        promo: false,
        promo_types: Vec::new(),
        ..AuthorityCard::default()
    }
}

/// In-memory authority keyed by (set code, number) and by identifier
#[derive(Default)]
pub struct FakeAuthority {
    by_number: HashMap<(String, String), AuthorityCard>,
    by_id: HashMap<String, AuthorityCard>,
    pub calls: AtomicUsize,
    pub fail: bool,
    delay: Duration,
}

impl FakeAuthority {
    pub fn with_card(mut self, card: AuthorityCard) -> Self {
        self.by_id.insert(card.id.clone(), card.clone());
        self.by_number
            .insert((card.set.clone(), card.collector_number.clone()), card);
        self
    }

    /// Answer every request only after `ms` milliseconds
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn called(&self) -> Result<(), VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            Err(VerifierError::Status(503))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthorityClient for FakeAuthority {
    async fn card_by_id(&self, id: &str) -> Result<Option<AuthorityCard>, VerifierError> {
        self.called().await?;
        Ok(self.by_id.get(id).cloned())
    }

    async fn card_by_number(&self, set_code: &str, number: &str) -> Result<Option<AuthorityCard>, VerifierError> {
        self.called().await?;
        Ok(self
            .by_number
            .get(&(set_code.to_string(), number.to_string()))
            .cloned())
    }

    async fn search_in_set(&self, name: &str, set_code: &str) -> Result<Vec<AuthorityCard>, VerifierError> {
        self.called().await?;
        Ok(self
            .by_number
            .values()
            .filter(|c| c.set == set_code && c.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect())
    }
}

pub fn verifier(config: &TomlConfig, client: Arc<FakeAuthority>) -> Arc<ExternalVerifier> {
    Arc::new(ExternalVerifier::new(client, &config.verifier, &config.aliases))
}

/// Review surface replaying a fixed list of actions
///
/// Records the name of every item it is shown. Runs out of actions with
/// `InputClosed`.
pub struct ScriptedSurface {
    actions: VecDeque<ReviewAction>,
    pub shown: Arc<Mutex<Vec<String>>>,
    fail_open: bool,
}

impl ScriptedSurface {
    pub fn new(actions: Vec<ReviewAction>) -> Self {
        Self {
            actions: actions.into(),
            shown: Arc::new(Mutex::new(Vec::new())),
            fail_open: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new())
        }
    }
}

impl DecisionSurface for ScriptedSurface {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open(&mut self, _total: usize) -> Result<(), SurfaceError> {
        if self.fail_open {
            Err(SurfaceError::Unavailable("no terminal".to_string()))
        } else {
            Ok(())
        }
    }

    fn prompt(&mut self, prompt: &ReviewPrompt<'_>) -> Result<ReviewAction, SurfaceError> {
        self.shown
            .lock()
            .expect("shown lock")
            .push(prompt.item.key.name.clone());
        self.actions.pop_front().ok_or(SurfaceError::InputClosed)
    }
}
