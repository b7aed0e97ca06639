//! Reference records and the in-memory reference catalog

use super::key::NormalizedKey;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Where a reference record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordOrigin {
    /// Row of the reference dataset
    Reference,
    /// Synthesized from an authority lookup
    Authority,
}

/// Raw price columns of a reference row, kept as text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceFields {
    /// `TCG Marketplace Price`
    pub marketplace: Option<String>,
    /// `TCG Market Price`
    pub market: Option<String>,
    /// `List Price`
    pub list: Option<String>,
    /// `Retail Price`
    pub retail: Option<String>,
}

impl PriceFields {
    /// Non-empty price texts in preference order
    pub fn in_preference_order(&self) -> impl Iterator<Item = &str> {
        [&self.marketplace, &self.market, &self.list, &self.retail]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// One purchasable product variant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRecord {
    /// Opaque product identifier (`TCGplayer Id`)
    pub identifier: String,
    /// Product line (game)
    pub product_line: String,
    /// Set name as listed
    pub set_name: String,
    /// Product name as listed
    pub product_name: String,
    /// Collector number as listed
    pub number: String,
    /// Rarity as listed
    pub rarity: String,
    /// Condition as listed
    pub condition: String,
    /// Price columns
    pub prices: PriceFields,
    /// Dataset row or authority synthesis
    pub origin: RecordOrigin,
}

/// Handle to a reference record
///
/// Dataset rows live in the [`ReferenceCatalog`]; synthesized records live in
/// the resolution context's authority pool. The variant says which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordRef {
    /// Index into the reference catalog
    Reference(usize),
    /// Index into the synthesized-record pool
    Authority(usize),
}

impl RecordRef {
    /// True for authority-synthesized records
    pub fn is_synthesized(&self) -> bool {
        matches!(self, RecordRef::Authority(_))
    }
}

/// Borrowed view of one catalog row
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    /// Position in the catalog
    pub index: usize,
    /// Normalized key of the row
    pub key: &'a NormalizedKey,
    /// The row itself
    pub record: &'a ReferenceRecord,
}

/// Reference dataset indexed by normalized key
///
/// Rows whose keys collide collapse to one entry: the later row replaces the
/// earlier one but keeps its position. Rows the normalizer rejects are not
/// indexed at all.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    records: Vec<ReferenceRecord>,
    keys: Vec<NormalizedKey>,
}

impl ReferenceCatalog {
    /// Build the catalog, computing each row's key with `key_of`
    pub fn build<F>(records: Vec<ReferenceRecord>, mut key_of: F) -> Self
    where
        F: FnMut(&ReferenceRecord) -> Option<NormalizedKey>,
    {
        let mut position: HashMap<NormalizedKey, usize> = HashMap::new();
        let mut catalog = Self::default();
        let mut rejected = 0usize;
        let mut collapsed = 0usize;

        for record in records {
            let Some(key) = key_of(&record) else {
                rejected += 1;
                continue;
            };
            match position.get(&key) {
                Some(&idx) => {
                    catalog.records[idx] = record;
                    collapsed += 1;
                }
                None => {
                    position.insert(key.clone(), catalog.records.len());
                    catalog.records.push(record);
                    catalog.keys.push(key);
                }
            }
        }

        debug!(
            indexed = catalog.records.len(),
            rejected, collapsed, "Reference catalog built"
        );
        catalog
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was indexed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Option<&ReferenceRecord> {
        self.records.get(index)
    }

    /// Key of the record at `index`
    pub fn key(&self, index: usize) -> Option<&NormalizedKey> {
        self.keys.get(index)
    }

    /// All rows in catalog order
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.records
            .iter()
            .zip(self.keys.iter())
            .enumerate()
            .map(|(index, (record, key))| CatalogEntry { index, key, record })
    }
}
