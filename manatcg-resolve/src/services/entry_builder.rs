//! Entry Builder & Merger
//!
//! Shapes resolved items into output rows and consolidates duplicates.
//!
//! **Entry shapes:**
//! - Confirmed: reference record fields, price from the source row
//! - Authority-verified: synthesized record fields, routed to its own stream
//! - Given-up: "Not Found" identifier, raw source name/set/number
//! - Token: reference record fields, price from the reference row first
//! - Token given-up: token set and rebuilt token name, rarity "Token"
//!
//! Only the main stream is merged; merging keys on (identifier, condition).

use crate::models::{EntryStream, OutputEntry, RecordOrigin, ReferenceRecord, SourceRow, NOT_FOUND_ID};
use crate::services::token_resolver::TokenIdentity;
use manatcg_common::config::OutputConfig;
use std::collections::HashMap;

/// Output row factory
pub struct EntryBuilder {
    floor_price: f64,
    product_line: String,
}

impl EntryBuilder {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            floor_price: config.floor_price,
            product_line: config.product_line.clone(),
        }
    }

    /// Build the entry for a regular card and name its stream
    pub fn build(
        &self,
        matched: Option<&ReferenceRecord>,
        row: &SourceRow,
        condition: &str,
    ) -> (EntryStream, OutputEntry) {
        match matched {
            Some(record) => {
                let stream = match record.origin {
                    RecordOrigin::Reference => EntryStream::Main,
                    RecordOrigin::Authority => EntryStream::Authority,
                };
                (stream, self.confirmed(record, row, condition))
            }
            None => (EntryStream::GivenUp, self.given_up(row, condition)),
        }
    }

    /// Entry for a matched record
    pub fn confirmed(&self, record: &ReferenceRecord, row: &SourceRow, condition: &str) -> OutputEntry {
        OutputEntry {
            identifier: record.identifier.clone(),
            product_line: self.product_line_of(record),
            set_name: record.set_name.clone(),
            product_name: record.product_name.clone(),
            number: record.number.clone(),
            rarity: record.rarity.clone(),
            condition: condition.to_string(),
            quantity: quantity_of(row),
            price: self.market_price(row, None),
        }
    }

    /// Entry for an item nothing was found for
    pub fn given_up(&self, row: &SourceRow, condition: &str) -> OutputEntry {
        OutputEntry {
            identifier: NOT_FOUND_ID.to_string(),
            product_line: self.product_line.clone(),
            set_name: row.set_name.trim().to_string(),
            product_name: row.name.trim().to_string(),
            number: row.collector_number.trim().to_string(),
            rarity: row.rarity.clone(),
            condition: condition.to_string(),
            quantity: quantity_of(row),
            price: self.market_price(row, None),
        }
    }

    /// Entry for a matched token
    pub fn token(&self, record: &ReferenceRecord, row: &SourceRow, condition: &str) -> OutputEntry {
        OutputEntry {
            identifier: record.identifier.clone(),
            product_line: self.product_line_of(record),
            set_name: record.set_name.clone(),
            product_name: record.product_name.clone(),
            number: record.number.clone(),
            rarity: record.rarity.clone(),
            condition: condition.to_string(),
            quantity: quantity_of(row),
            price: self.market_price(row, Some(record)),
        }
    }

    /// Entry for a token nothing was found for
    pub fn token_given_up(&self, token: &TokenIdentity, row: &SourceRow, condition: &str) -> OutputEntry {
        OutputEntry {
            identifier: NOT_FOUND_ID.to_string(),
            product_line: self.product_line.clone(),
            set_name: token.set_name.clone(),
            product_name: token.product_name.clone(),
            number: row.collector_number.trim().to_string(),
            rarity: "Token".to_string(),
            condition: condition.to_string(),
            quantity: quantity_of(row),
            price: self.market_price(row, None),
        }
    }

    /// First strictly positive price: reference fields, then purchase price,
    /// then the floor price
    pub fn market_price(&self, row: &SourceRow, reference: Option<&ReferenceRecord>) -> String {
        if let Some(record) = reference {
            if let Some(price) = record.prices.in_preference_order().find(|p| is_positive_price(p)) {
                return price.to_string();
            }
        }

        let purchase = row.purchase_price.trim();
        if is_positive_price(purchase) {
            return purchase.to_string();
        }

        format!("{:.2}", self.floor_price)
    }

    fn product_line_of(&self, record: &ReferenceRecord) -> String {
        if record.product_line.trim().is_empty() {
            self.product_line.clone()
        } else {
            record.product_line.clone()
        }
    }
}

fn quantity_of(row: &SourceRow) -> u32 {
    row.quantity().unwrap_or(1)
}

fn is_positive_price(text: &str) -> bool {
    text.parse::<f64>().map(|p| p.is_finite() && p > 0.0).unwrap_or(false)
}

/// Combine entries sharing (identifier, condition) by summing quantities
///
/// The first entry seen for a pair keeps its other fields and its position.
pub fn merge_entries(entries: Vec<OutputEntry>) -> Vec<OutputEntry> {
    let mut merged: Vec<OutputEntry> = Vec::with_capacity(entries.len());
    let mut position: HashMap<(String, String), usize> = HashMap::new();

    for entry in entries {
        let key = (entry.identifier.clone(), entry.condition.clone());
        match position.get(&key) {
            Some(&idx) => {
                let existing = &mut merged[idx];
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
            }
            None => {
                position.insert(key, merged.len());
                merged.push(entry);
            }
        }
    }

    merged
}
