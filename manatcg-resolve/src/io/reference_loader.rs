//! Reference dataset loading

use crate::error::{ResolveError, ResolveResult};
use crate::models::{PriceFields, RecordOrigin, ReferenceRecord};
use manatcg_common::config::FilterConfig;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Reference dataset row as written in the file
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "TCGplayer Id", default)]
    identifier: String,
    #[serde(rename = "Product Line", default)]
    product_line: String,
    #[serde(rename = "Set Name", default)]
    set_name: String,
    #[serde(rename = "Product Name", default)]
    product_name: String,
    #[serde(rename = "Number", default)]
    number: String,
    #[serde(rename = "Rarity", default)]
    rarity: String,
    #[serde(rename = "Condition", default)]
    condition: String,
    #[serde(rename = "TCG Marketplace Price", default)]
    marketplace_price: Option<String>,
    #[serde(rename = "TCG Market Price", default)]
    market_price: Option<String>,
    #[serde(rename = "List Price", default)]
    list_price: Option<String>,
    #[serde(rename = "Retail Price", default)]
    retail_price: Option<String>,
}

impl From<ReferenceRow> for ReferenceRecord {
    fn from(row: ReferenceRow) -> Self {
        let condition = if row.condition.trim().is_empty() {
            "Near Mint".to_string()
        } else {
            row.condition
        };

        Self {
            identifier: row.identifier,
            product_line: row.product_line,
            set_name: row.set_name,
            product_name: row.product_name,
            number: row.number,
            rarity: row.rarity,
            condition,
            prices: PriceFields {
                marketplace: row.marketplace_price,
                market: row.market_price,
                list: row.list_price,
                retail: row.retail_price,
            },
            origin: RecordOrigin::Reference,
        }
    }
}

/// Reference rows that survived loading, with counts of what did not
#[derive(Debug, Clone, Default)]
pub struct LoadedReference {
    /// Rows kept, in file order
    pub records: Vec<ReferenceRecord>,
    /// Rows removed by content filters
    pub excluded: usize,
    /// Rows without a set name
    pub missing_set: usize,
    /// Rows that failed to parse
    pub malformed: usize,
}

/// Compiled content filters
struct ContentFilter {
    prerelease: bool,
    promo: Option<Regex>,
}

impl ContentFilter {
    fn new(config: &FilterConfig) -> ResolveResult<Self> {
        let promo = if config.exclude_promo && !config.promo_patterns.is_empty() {
            let pattern = config.promo_patterns.join("|");
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ResolveError::InvalidFilter(e.to_string()))?;
            Some(regex)
        } else {
            None
        };

        Ok(Self {
            prerelease: config.exclude_prerelease,
            promo,
        })
    }

    fn excludes(&self, product_name: &str) -> bool {
        if self.prerelease && product_name.to_lowercase().contains("prerelease") {
            return true;
        }
        self.promo
            .as_ref()
            .map(|re| re.is_match(product_name))
            .unwrap_or(false)
    }
}

/// Load the reference dataset
///
/// A missing file is fatal; unreadable rows are skipped.
pub fn load_reference(path: &Path, filters: &FilterConfig) -> ResolveResult<LoadedReference> {
    if !path.exists() {
        return Err(ResolveError::ReferenceNotFound(path.to_path_buf()));
    }

    let filter = ContentFilter::new(filters)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| ResolveError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut loaded = LoadedReference::default();
    for (line, result) in reader.deserialize::<ReferenceRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping malformed reference row");
                loaded.malformed += 1;
                continue;
            }
        };

        if row.set_name.trim().is_empty() {
            loaded.missing_set += 1;
            continue;
        }
        if filter.excludes(&row.product_name) {
            loaded.excluded += 1;
            continue;
        }
        loaded.records.push(row.into());
    }

    info!(
        path = %path.display(),
        loaded = loaded.records.len(),
        excluded = loaded.excluded,
        missing_set = loaded.missing_set,
        malformed = loaded.malformed,
        "Reference dataset loaded"
    );
    Ok(loaded)
}
