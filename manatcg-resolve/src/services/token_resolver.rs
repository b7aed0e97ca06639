//! Token resolution
//!
//! Tokens are matched against a token-only slice of the reference catalog and
//! never consult the authority.
//!
//! **Rules:**
//! - An item is a token when its set or name mentions "token", or its set name
//!   is a bare token-set code (`T` followed by capitals/digits)
//! - A token-set code `TXYZ` reads as set `XYZ tokens`
//! - `A // B Double-Sided Token` is rebuilt as `A // B`
//! - The token slice holds rows whose set or product mentions "token" and
//!   whose set contains the token set name or its base (name without
//!   " tokens")
//! - An auto-confirmed double-faced token is deferred anyway when the best
//!   double-faced candidate is a different record

use crate::models::{CatalogEntry, Candidate, RecordRef, ReferenceCatalog};
use crate::services::classifier::Classification;
use crate::services::normalizer::FACE_SEPARATOR;
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_SET_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^T[A-Z0-9]+$").expect("token set code pattern is valid"));

static DOUBLE_SIDED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)double[-\s]?sided token").expect("double-sided pattern is valid"));

/// True when a collection row describes a token
pub fn is_token(name: &str, set_name: &str) -> bool {
    set_name.to_lowercase().contains("token")
        || name.to_lowercase().contains("token")
        || TOKEN_SET_CODE.is_match(set_name)
}

/// True when a reference product name looks double-faced
pub fn is_double_faced_product(product_name: &str) -> bool {
    let lower = product_name.to_lowercase();
    lower.contains(FACE_SEPARATOR) || (lower.contains("double") && lower.contains("sided"))
}

/// Token set and product names derived from a collection row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    /// Token set name, e.g. `MH2 tokens`
    pub set_name: String,
    /// Token product name, double-faced names rebuilt as `A // B`
    pub product_name: String,
    /// Lowercase set name without " tokens"
    pub set_base: String,
    /// The raw name had two faces
    pub double_faced: bool,
}

impl TokenIdentity {
    pub fn from_row(name: &str, set_name: &str) -> Self {
        let set_name = if TOKEN_SET_CODE.is_match(set_name) {
            format!("{} tokens", &set_name[1..])
        } else {
            set_name.to_string()
        };
        let set_base = set_name.to_lowercase().replace(" tokens", "");

        let double_faced = name.contains(FACE_SEPARATOR);
        let product_name = match name.split(FACE_SEPARATOR).collect::<Vec<_>>().as_slice() {
            [front, back, ..] => {
                let back = DOUBLE_SIDED_MARKER.replace_all(back, "");
                format!("{} {} {}", front.trim(), FACE_SEPARATOR, back.trim())
            }
            _ => name.to_string(),
        };

        Self {
            set_name,
            product_name,
            set_base,
            double_faced,
        }
    }

    /// True when a catalog row belongs to this token's slice
    pub fn in_scope(&self, entry: &CatalogEntry<'_>) -> bool {
        let set = entry.record.set_name.to_lowercase();
        let product = entry.record.product_name.to_lowercase();

        (set.contains("token") || product.contains("token"))
            && (set.contains(&self.set_name.to_lowercase()) || set.contains(&self.set_base))
    }

    /// Catalog indices of this token's slice
    pub fn scope(&self, catalog: &ReferenceCatalog) -> Vec<usize> {
        catalog
            .entries()
            .filter(|entry| self.in_scope(entry))
            .map(|entry| entry.index)
            .collect()
    }
}

/// Outcome of the token path for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerdict {
    /// Accept this candidate
    Confirm(Candidate),
    /// Queue for review with these candidates
    Defer(Vec<Candidate>),
    /// Nothing in the token slice
    GiveUp,
}

/// Apply the double-faced override to a token classification
pub fn token_verdict(
    classification: Classification,
    candidates: &[Candidate],
    identity: &TokenIdentity,
    catalog: &ReferenceCatalog,
) -> TokenVerdict {
    match classification {
        Classification::Reject => TokenVerdict::GiveUp,
        Classification::Defer => TokenVerdict::Defer(candidates.to_vec()),
        Classification::AutoConfirm { candidate, .. } => {
            if identity.double_faced {
                let double_faced: Vec<Candidate> = candidates
                    .iter()
                    .filter(|c| is_double_faced_candidate(c.record, catalog))
                    .copied()
                    .collect();
                if let Some(best) = double_faced.first() {
                    if best.record != candidate.record {
                        return TokenVerdict::Defer(double_faced);
                    }
                }
            }
            TokenVerdict::Confirm(candidate)
        }
    }
}

fn is_double_faced_candidate(record: RecordRef, catalog: &ReferenceCatalog) -> bool {
    match record {
        RecordRef::Reference(idx) => catalog
            .get(idx)
            .map(|r| is_double_faced_product(&r.product_name))
            .unwrap_or(false),
        RecordRef::Authority(_) => false,
    }
}
