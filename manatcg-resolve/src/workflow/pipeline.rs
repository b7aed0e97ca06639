//! Resolution Pipeline
//!
//! Runs one collection export through identity resolution.
//!
//! # Stages
//! 1. **Prepare**: normalize every row; rows without a name or set are
//!    skipped, prerelease-only items are rejected
//! 2. **Score**: every distinct card key against the whole catalog
//! 3. **Verify**: keys with no candidate or a weak top score go to the
//!    authority through a bounded pool; confirmed printings become
//!    synthesized candidates in front of the list
//! 4. **Classify**: in input order; confirmations are memoized, ambiguous
//!    items join the deferred queue, which is then frozen
//! 5. **Review**: the frozen queue, on a blocking thread
//! 6. **Build**: one entry per row, main stream merged
//!
//! Tokens skip stages 2 and 3: they are scored against their token slice of
//! the catalog while classifying and never reach the authority.
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(&config, &catalog, Some(verifier));
//! let output = pipeline.run(&collection.rows, coordinator).await?;
//! ```

use super::context::{ReferenceSubset, ResolutionContext};
use super::summary::RunSummary;
use crate::error::{ResolveError, ResolveResult};
use crate::models::{
    Candidate, EntryStream, NormalizedKey, OutputEntry, RecordRef, ReferenceCatalog, ScoreOutcome,
    SourceRow,
};
use crate::services::authority::{synthesize_record, AuthorityCard, ExternalVerifier};
use crate::services::classifier::{Classification, ConfidenceClassifier, ConfirmRule};
use crate::services::entry_builder::{merge_entries, EntryBuilder};
use crate::services::normalizer::KeyNormalizer;
use crate::services::review::{CandidateView, ReviewCoordinator, ReviewItem, ReviewOutcome};
use crate::services::scorer::CandidateScorer;
use crate::services::token_resolver::{is_token, token_verdict, TokenIdentity, TokenVerdict};
use futures::stream::{self, StreamExt};
use manatcg_common::config::{MatchPolicy, TomlConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a prepared item is matched
#[derive(Debug, Clone)]
enum ItemKind {
    Card,
    Token(TokenIdentity),
}

/// A collection row ready for matching
#[derive(Debug, Clone)]
struct PreparedItem {
    /// Index into the collection rows
    row: usize,
    /// Display condition written on the entry
    condition: String,
    key: NormalizedKey,
    kind: ItemKind,
}

/// Where an item stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Matched(RecordRef),
    /// Waiting on review
    Deferred,
    GivenUp,
}

/// Entries produced by a run
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Reference matches, merged by (identifier, condition)
    pub main: Vec<OutputEntry>,
    /// Authority-verified matches, one per row
    pub authority: Vec<OutputEntry>,
    /// Items nothing was accepted for, one per row
    pub given_up: Vec<OutputEntry>,
    pub summary: RunSummary,
}

/// Resolution pipeline over one reference catalog
pub struct Pipeline<'a> {
    catalog: &'a ReferenceCatalog,
    normalizer: KeyNormalizer,
    scorer: CandidateScorer,
    classifier: ConfidenceClassifier,
    builder: EntryBuilder,
    verifier: Option<Arc<ExternalVerifier>>,
    policy: MatchPolicy,
    product_line: String,
    max_concurrency: usize,
    display_limit: usize,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline; `verifier` is `None` when running offline
    pub fn new(
        config: &TomlConfig,
        catalog: &'a ReferenceCatalog,
        verifier: Option<Arc<ExternalVerifier>>,
    ) -> Self {
        Self {
            catalog,
            normalizer: KeyNormalizer::new(&config.aliases),
            scorer: CandidateScorer::new(config.policy.clone()),
            classifier: ConfidenceClassifier::new(&config.policy),
            builder: EntryBuilder::new(&config.output),
            verifier,
            policy: config.policy.clone(),
            product_line: config.output.product_line.clone(),
            max_concurrency: config.verifier.max_concurrency.max(1),
            display_limit: config.review.display_limit.max(1),
        }
    }

    /// Resolve, review and build entries
    pub async fn run(&self, rows: &[SourceRow], coordinator: ReviewCoordinator) -> ResolveResult<RunOutput> {
        let mut run = self.resolve(rows).await?;

        let items = run.review_items();
        let outcome = if items.is_empty() {
            coordinator.review(&items)
        } else {
            tokio::task::spawn_blocking(move || coordinator.review(&items))
                .await
                .map_err(|e| ResolveError::ReviewTask(e.to_string()))?
        };

        run.apply_review(&outcome)?;
        Ok(run.into_output())
    }

    /// Run every stage up to review and freeze the deferred queue
    pub async fn resolve<'r>(&'r self, rows: &'r [SourceRow]) -> ResolveResult<ResolutionRun<'r>> {
        let mut summary = RunSummary {
            rows_read: rows.len(),
            ..RunSummary::default()
        };
        let mut ctx = ResolutionContext::new();

        let items = self.prepare(rows, &mut summary);
        let (order, mut outcomes) = self.score_cards(&items, &mut summary);
        self.verify_weak(rows, &items, &order, &mut outcomes, &mut ctx, &mut summary)
            .await;
        let resolutions = self.classify(&items, &outcomes, &mut ctx, &mut summary)?;

        ctx.freeze();
        summary.deferred = ctx.deferred().len();
        info!(
            items = items.len(),
            distinct_cards = order.len(),
            confirmed = ctx.confirmed_count(),
            deferred = summary.deferred,
            "Resolution pass complete"
        );

        Ok(ResolutionRun {
            pipeline: self,
            rows,
            items,
            resolutions,
            ctx,
            summary,
        })
    }

    fn prepare(&self, rows: &[SourceRow], summary: &mut RunSummary) -> Vec<PreparedItem> {
        let mut items = Vec::with_capacity(rows.len());

        for (row_idx, row) in rows.iter().enumerate() {
            let name = row.name.trim();
            let set_name = row.set_name.trim();
            if name.is_empty() || set_name.is_empty() {
                summary.incomplete_rows += 1;
                continue;
            }

            let condition = row.display_condition();
            let (key, kind) = if is_token(name, set_name) {
                let identity = TokenIdentity::from_row(name, set_name);
                let key = self.normalizer.normalize(
                    &identity.product_name,
                    &identity.set_name,
                    &condition,
                    row.collector_number.trim(),
                );
                (key, ItemKind::Token(identity))
            } else {
                let key = self
                    .normalizer
                    .normalize(name, set_name, &condition, row.matching_number());
                (key, ItemKind::Card)
            };

            match key {
                Some(key) => items.push(PreparedItem {
                    row: row_idx,
                    condition,
                    key,
                    kind,
                }),
                None => {
                    debug!(name = %name, set = %set_name, "Skipping prerelease item");
                    summary.rejected_rows += 1;
                }
            }
        }

        items
    }

    /// Distinct card keys in first-seen order, with their scores
    fn score_cards(
        &self,
        items: &[PreparedItem],
        summary: &mut RunSummary,
    ) -> (Vec<NormalizedKey>, HashMap<NormalizedKey, ScoreOutcome>) {
        let mut order = Vec::new();
        let mut outcomes = HashMap::new();

        for item in items.iter().filter(|i| matches!(i.kind, ItemKind::Card)) {
            if outcomes.contains_key(&item.key) {
                continue;
            }
            let outcome = self.scorer.score_catalog(&item.key, self.catalog);
            if outcome.warning.is_some() {
                summary.low_confidence_warnings += 1;
            }
            order.push(item.key.clone());
            outcomes.insert(item.key.clone(), outcome);
        }

        debug!(keys = order.len(), "Scored distinct card keys");
        (order, outcomes)
    }

    async fn verify_weak(
        &self,
        rows: &[SourceRow],
        items: &[PreparedItem],
        order: &[NormalizedKey],
        outcomes: &mut HashMap<NormalizedKey, ScoreOutcome>,
        ctx: &mut ResolutionContext,
        summary: &mut RunSummary,
    ) {
        let Some(verifier) = self.verifier.as_deref() else {
            return;
        };

        let mut first_item: HashMap<&NormalizedKey, &PreparedItem> = HashMap::new();
        for item in items.iter().filter(|i| matches!(i.kind, ItemKind::Card)) {
            first_item.entry(&item.key).or_insert(item);
        }

        let pending: Vec<(usize, &NormalizedKey, Option<&str>)> = order
            .iter()
            .enumerate()
            .filter(|(_, key)| self.needs_verification(outcomes.get(*key)))
            .map(|(slot, key)| {
                let authority_id = first_item
                    .get(key)
                    .and_then(|item| rows.get(item.row))
                    .and_then(SourceRow::authority_id);
                (slot, key, authority_id)
            })
            .collect();

        if pending.is_empty() {
            return;
        }
        info!(
            keys = pending.len(),
            concurrency = self.max_concurrency,
            "Verifying weak matches with the authority"
        );
        summary.authority_lookups = pending.len();

        let mut found: Vec<(usize, Option<AuthorityCard>)> = stream::iter(pending)
            .map(|(slot, key, authority_id)| async move { (slot, verifier.verify(key, authority_id).await) })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        found.sort_by_key(|(slot, _)| *slot);

        for (slot, card) in found {
            let Some(card) = card else {
                continue;
            };
            let key = &order[slot];
            let Some(outcome) = outcomes.get_mut(key) else {
                continue;
            };

            let weak = outcome
                .top_score()
                .map_or(true, |score| score < self.policy.synthesize_below);
            if !weak {
                continue;
            }

            let condition = first_item
                .get(key)
                .map(|item| item.condition.as_str())
                .unwrap_or("Near Mint");
            let record = synthesize_record(&card, condition, &self.product_line);
            debug!(key = %key, product = %record.product_name, "Synthesized authority candidate");
            let handle = ctx.add_synthesized(record);
            outcome.insert_front(Candidate::new(handle, self.policy.synthesized_score));
            summary.synthesized += 1;
        }
    }

    fn needs_verification(&self, outcome: Option<&ScoreOutcome>) -> bool {
        outcome
            .and_then(ScoreOutcome::top_score)
            .map_or(true, |score| score < self.policy.verify_below)
    }

    fn classify(
        &self,
        items: &[PreparedItem],
        outcomes: &HashMap<NormalizedKey, ScoreOutcome>,
        ctx: &mut ResolutionContext,
        summary: &mut RunSummary,
    ) -> ResolveResult<Vec<Resolution>> {
        let mut resolutions = Vec::with_capacity(items.len());
        let mut token_verdicts: HashMap<(String, NormalizedKey), TokenVerdict> = HashMap::new();

        for (idx, item) in items.iter().enumerate() {
            if let Some(record) = ctx.confirmed(&item.key) {
                summary.memo_hits += 1;
                resolutions.push(Resolution::Matched(record));
                continue;
            }

            let resolution = match &item.kind {
                ItemKind::Card => {
                    let candidates = outcomes
                        .get(&item.key)
                        .map(|o| o.candidates.as_slice())
                        .unwrap_or(&[]);

                    match self.classifier.classify(candidates) {
                        Classification::AutoConfirm { candidate, rule } => {
                            if rule == ConfirmRule::AuthorityFloor {
                                summary.authority_verified += 1;
                            } else {
                                summary.auto_confirmed += 1;
                            }
                            ctx.confirm(item.key.clone(), candidate.record);
                            Resolution::Matched(candidate.record)
                        }
                        Classification::Defer => {
                            ctx.defer(item.key.clone(), candidates.to_vec(), ReferenceSubset::Catalog, idx)?;
                            Resolution::Deferred
                        }
                        Classification::Reject => Resolution::GivenUp,
                    }
                }
                ItemKind::Token(identity) => {
                    let verdict = token_verdicts
                        .entry((identity.set_name.clone(), item.key.clone()))
                        .or_insert_with(|| self.resolve_token(&item.key, identity, summary))
                        .clone();

                    match verdict {
                        TokenVerdict::Confirm(candidate) => {
                            summary.tokens_confirmed += 1;
                            ctx.confirm(item.key.clone(), candidate.record);
                            Resolution::Matched(candidate.record)
                        }
                        TokenVerdict::Defer(candidates) => {
                            let subset = ReferenceSubset::Tokens {
                                set_name: identity.set_name.clone(),
                            };
                            ctx.defer(item.key.clone(), candidates, subset, idx)?;
                            Resolution::Deferred
                        }
                        TokenVerdict::GiveUp => Resolution::GivenUp,
                    }
                }
            };
            resolutions.push(resolution);
        }

        Ok(resolutions)
    }

    fn resolve_token(&self, key: &NormalizedKey, identity: &TokenIdentity, summary: &mut RunSummary) -> TokenVerdict {
        let outcome = self
            .scorer
            .score(key, self.catalog.entries().filter(|entry| identity.in_scope(entry)));
        if outcome.warning.is_some() {
            summary.low_confidence_warnings += 1;
        }

        let classification = self.classifier.classify_token(&outcome.candidates);
        token_verdict(classification, &outcome.candidates, identity, self.catalog)
    }
}

/// A resolved collection waiting for review
pub struct ResolutionRun<'r> {
    pipeline: &'r Pipeline<'r>,
    rows: &'r [SourceRow],
    items: Vec<PreparedItem>,
    resolutions: Vec<Resolution>,
    ctx: ResolutionContext,
    summary: RunSummary,
}

impl<'r> ResolutionRun<'r> {
    pub fn context(&self) -> &ResolutionContext {
        &self.ctx
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// The frozen queue as shown to the operator, candidates capped at the
    /// display limit
    pub fn review_items(&self) -> Vec<ReviewItem> {
        self.ctx
            .deferred()
            .iter()
            .map(|deferred| ReviewItem {
                key: deferred.key.clone(),
                candidates: deferred
                    .candidates
                    .iter()
                    .take(self.pipeline.display_limit)
                    .map(|c| self.candidate_view(c))
                    .collect(),
                waiting_rows: deferred.waiting.len(),
            })
            .collect()
    }

    fn candidate_view(&self, candidate: &Candidate) -> CandidateView {
        match self.ctx.record(self.pipeline.catalog, candidate.record) {
            Some(record) => CandidateView {
                product_name: record.product_name.clone(),
                set_name: record.set_name.clone(),
                number: record.number.clone(),
                condition: record.condition.clone(),
                score: candidate.score,
                synthesized: candidate.record.is_synthesized(),
            },
            None => {
                warn!(record = ?candidate.record, "Candidate refers to a missing record");
                CandidateView {
                    product_name: String::new(),
                    set_name: String::new(),
                    number: String::new(),
                    condition: String::new(),
                    score: candidate.score,
                    synthesized: candidate.record.is_synthesized(),
                }
            }
        }
    }

    /// Apply one decision per deferred item
    ///
    /// Confirmed items are memoized and resolve every row waiting on them;
    /// skipped and cancelled items give up those rows.
    pub fn apply_review(&mut self, outcome: &ReviewOutcome) -> ResolveResult<()> {
        let expected = self.ctx.deferred().len();
        if outcome.decisions.len() != expected {
            return Err(ResolveError::ReviewMismatch {
                expected,
                got: outcome.decisions.len(),
            });
        }

        let mut confirmations = Vec::new();
        for (position, deferred) in self.ctx.deferred().iter().enumerate() {
            let chosen = outcome
                .selection(position)
                .and_then(|idx| deferred.candidates.get(idx))
                .map(|c| c.record);

            let resolution = match chosen {
                Some(record) => {
                    self.summary.review_confirmed += 1;
                    confirmations.push((deferred.key.clone(), record));
                    Resolution::Matched(record)
                }
                None => {
                    self.summary.review_unmatched += 1;
                    Resolution::GivenUp
                }
            };
            for &item in &deferred.waiting {
                self.resolutions[item] = resolution;
            }
        }

        for (key, record) in confirmations {
            self.ctx.confirm(key, record);
        }
        self.summary.review_fell_back = outcome.fell_back;
        Ok(())
    }

    /// Build one entry per item and merge the main stream
    ///
    /// Items still waiting on review are given up.
    pub fn into_output(self) -> RunOutput {
        let builder = &self.pipeline.builder;
        let mut main = Vec::new();
        let mut authority = Vec::new();
        let mut given_up = Vec::new();

        for (item, resolution) in self.items.iter().zip(&self.resolutions) {
            let Some(row) = self.rows.get(item.row) else {
                continue;
            };
            let matched = match resolution {
                Resolution::Matched(record) => self.ctx.record(self.pipeline.catalog, *record),
                Resolution::Deferred | Resolution::GivenUp => None,
            };

            let (stream, entry) = match &item.kind {
                ItemKind::Card => builder.build(matched, row, &item.condition),
                ItemKind::Token(identity) => match matched {
                    Some(record) => (EntryStream::Main, builder.token(record, row, &item.condition)),
                    None => (
                        EntryStream::GivenUp,
                        builder.token_given_up(identity, row, &item.condition),
                    ),
                },
            };

            match stream {
                EntryStream::Main => main.push(entry),
                EntryStream::Authority => authority.push(entry),
                EntryStream::GivenUp => given_up.push(entry),
            }
        }

        let main = merge_entries(main);
        let mut summary = self.summary;
        summary.main_entries = main.len();
        summary.authority_entries = authority.len();
        summary.given_up_entries = given_up.len();

        RunOutput {
            main,
            authority,
            given_up,
            summary,
        }
    }
}
